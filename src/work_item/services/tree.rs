//! Tree assembler: per-query forests and the lazily expanded board tree.

use super::{HydratedItems, ItemHydrator, QueryExecutor, QueryOutcome, RefreshSignal};
use crate::work_item::{
    domain::{MissingContext, Query, QueryId, WorkItem, WorkItemId},
    ports::{GitRemote, RemoteServiceError, WorkItemStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// All items of one query, stored flat with a parent index.
///
/// The index is built once when the forest is created and never changes.
#[derive(Debug)]
pub struct QueryForest {
    query: Query,
    items: Vec<Arc<WorkItem>>,
    children: HashMap<Option<WorkItemId>, Vec<usize>>,
    fetched_at: DateTime<Utc>,
}

impl QueryForest {
    /// Builds a forest from a hydrated collection.
    #[must_use]
    pub fn new(query: Query, hydrated: HydratedItems) -> Self {
        Self::from_items(query, hydrated.items, hydrated.fetched_at)
    }

    /// Builds a forest from items in display order.
    #[must_use]
    pub fn from_items(query: Query, items: Vec<WorkItem>, fetched_at: DateTime<Utc>) -> Self {
        let mut children: HashMap<Option<WorkItemId>, Vec<usize>> = HashMap::new();
        for (position, item) in items.iter().enumerate() {
            children.entry(item.parent()).or_default().push(position);
        }
        Self {
            query,
            items: items.into_iter().map(Arc::new).collect(),
            children,
            fetched_at,
        }
    }

    /// Returns the query this forest was loaded for.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Returns when the underlying items were fetched.
    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Returns every item in display order.
    pub fn items(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter().map(AsRef::as_ref)
    }

    /// Returns the items without a parent, in display order.
    #[must_use]
    pub fn roots(&self) -> Vec<Arc<WorkItem>> {
        self.lookup(None)
    }

    /// Returns the items whose parent is `id`, in display order.
    #[must_use]
    pub fn children_of(&self, id: WorkItemId) -> Vec<Arc<WorkItem>> {
        self.lookup(Some(id))
    }

    /// Returns true when any item declares `id` as its parent.
    #[must_use]
    pub fn has_children(&self, id: WorkItemId) -> bool {
        self.children
            .get(&Some(id))
            .is_some_and(|positions| !positions.is_empty())
    }

    /// Finds an item by id.
    #[must_use]
    pub fn get(&self, id: WorkItemId) -> Option<&WorkItem> {
        self.items().find(|item| item.id() == id)
    }

    fn lookup(&self, parent: Option<WorkItemId>) -> Vec<Arc<WorkItem>> {
        self.children
            .get(&parent)
            .map(|positions| {
                positions
                    .iter()
                    .filter_map(|position| self.items.get(*position).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Node in the board tree.
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// No workspace folder is open.
    NoOpenFolder,
    /// No remote organization is configured.
    NoConnection,
    /// A saved query; expanding it loads the query's forest.
    Query(Query),
    /// The query could not run because part of the context is missing.
    Unavailable(MissingContext),
    /// A work item within a loaded forest.
    Item(ItemNode),
}

impl TreeNode {
    /// Returns true when the node can be expanded.
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        match self {
            Self::Query(_) => true,
            Self::Item(node) => node.has_children(),
            Self::NoOpenFolder | Self::NoConnection | Self::Unavailable(_) => false,
        }
    }

    /// Returns the label shown for the node.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::NoOpenFolder => "Open a folder to use the board".to_owned(),
            Self::NoConnection => "Click to connect to an organization".to_owned(),
            Self::Query(query) => query.name.clone(),
            Self::Unavailable(missing) => format!("No {missing} configured"),
            Self::Item(node) => node.label(),
        }
    }

    /// Returns the work item, for item nodes.
    #[must_use]
    pub fn work_item(&self) -> Option<&WorkItem> {
        match self {
            Self::Item(node) => Some(node.item()),
            _ => None,
        }
    }
}

/// Work item node: the item plus the forest it belongs to.
#[derive(Debug, Clone)]
pub struct ItemNode {
    forest: Arc<QueryForest>,
    item: Arc<WorkItem>,
}

impl ItemNode {
    /// Returns the work item.
    #[must_use]
    pub fn item(&self) -> &WorkItem {
        &self.item
    }

    /// Returns true when another item in the forest declares this one as
    /// parent.
    #[must_use]
    pub fn has_children(&self) -> bool {
        self.forest.has_children(self.item.id())
    }

    /// Returns the child nodes in display order.
    #[must_use]
    pub fn children(&self) -> Vec<TreeNode> {
        item_nodes(&self.forest, self.forest.children_of(self.item.id()))
    }

    /// Returns `"<glyph> <id> <title>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{} {} {}",
            self.item.state_glyph(),
            self.item.id(),
            self.item.title()
        )
    }

    /// Returns `"<assignee>  •  <state>"`.
    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{}  \u{2022}  {}",
            self.item.assignee_label(),
            self.item.state()
        )
    }

    /// Returns the hover text.
    #[must_use]
    pub fn tooltip(&self) -> String {
        format!(
            "{}: {} {}\nAssigned to: {}\nState: {}",
            self.item.work_item_type(),
            self.item.id(),
            self.item.title(),
            self.item.assignee_label(),
            self.item.state()
        )
    }
}

fn item_nodes(forest: &Arc<QueryForest>, items: Vec<Arc<WorkItem>>) -> Vec<TreeNode> {
    items
        .into_iter()
        .map(|item| {
            TreeNode::Item(ItemNode {
                forest: Arc::clone(forest),
                item,
            })
        })
        .collect()
}

/// Result of loading one query.
#[derive(Debug)]
pub enum LoadedQuery {
    /// The query ran and its items were hydrated.
    Forest(QueryForest),
    /// The query was skipped because part of the context is missing.
    Skipped(MissingContext),
}

/// Loads the forest for a query; the read path behind the tree.
#[async_trait]
pub trait ForestLoader: Send + Sync {
    /// Runs the query and hydrates its items.
    async fn load(&self, query: &Query) -> Result<LoadedQuery, RemoteServiceError>;
}

/// Read path composed of the query executor and the item hydrator.
#[derive(Clone)]
pub struct ReadPipeline<S, G, C>
where
    S: WorkItemStore,
    G: GitRemote,
    C: Clock + Send + Sync,
{
    executor: QueryExecutor<S>,
    hydrator: ItemHydrator<S, G, C>,
}

impl<S, G, C> ReadPipeline<S, G, C>
where
    S: WorkItemStore,
    G: GitRemote,
    C: Clock + Send + Sync,
{
    /// Creates a read pipeline.
    #[must_use]
    pub const fn new(executor: QueryExecutor<S>, hydrator: ItemHydrator<S, G, C>) -> Self {
        Self { executor, hydrator }
    }
}

#[async_trait]
impl<S, G, C> ForestLoader for ReadPipeline<S, G, C>
where
    S: WorkItemStore,
    G: GitRemote,
    C: Clock + Send + Sync,
{
    async fn load(&self, query: &Query) -> Result<LoadedQuery, RemoteServiceError> {
        let ids = match self.executor.execute(&query.id).await? {
            QueryOutcome::Items(ids) => ids,
            QueryOutcome::Skipped(missing) => return Ok(LoadedQuery::Skipped(missing)),
        };
        let scope = match self.executor.scope() {
            Ok(scope) => scope,
            Err(missing) => return Ok(LoadedQuery::Skipped(missing)),
        };
        let hydrated = self.hydrator.hydrate(scope, &ids).await?;
        Ok(LoadedQuery::Forest(QueryForest::new(query.clone(), hydrated)))
    }
}

/// Host state that decides what the top level of the tree shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TreeContext {
    /// Whether a workspace folder is open.
    pub workspace_open: bool,
    /// Whether a remote organization is configured.
    pub connected: bool,
    /// Saved queries, one top-level node each.
    pub queries: Vec<Query>,
}

/// Errors returned while expanding tree nodes.
#[derive(Debug, Error)]
pub enum TreeError {
    /// Loading the query failed.
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
    /// The forest cache lock was poisoned.
    #[error("forest cache unavailable: {0}")]
    Cache(String),
}

#[derive(Debug, Default)]
struct ForestCache {
    generation: u64,
    forests: HashMap<QueryId, Arc<QueryForest>>,
}

/// Board tree with lazily loaded, per-refresh cached query forests.
pub struct BoardTree<L>
where
    L: ForestLoader,
{
    loader: Arc<L>,
    context: TreeContext,
    refresh: RefreshSignal,
    cache: RwLock<ForestCache>,
}

impl<L> BoardTree<L>
where
    L: ForestLoader,
{
    /// Creates a tree over `loader`.
    #[must_use]
    pub fn new(loader: Arc<L>, context: TreeContext, refresh: RefreshSignal) -> Self {
        let generation = refresh.generation();
        Self {
            loader,
            context,
            refresh,
            cache: RwLock::new(ForestCache {
                generation,
                forests: HashMap::new(),
            }),
        }
    }

    /// Returns the top-level nodes.
    ///
    /// A missing workspace takes precedence over a missing connection,
    /// which takes precedence over the query list.
    #[must_use]
    pub fn roots(&self) -> Vec<TreeNode> {
        if !self.context.workspace_open {
            return vec![TreeNode::NoOpenFolder];
        }
        if !self.context.connected {
            return vec![TreeNode::NoConnection];
        }
        self.context
            .queries
            .iter()
            .cloned()
            .map(TreeNode::Query)
            .collect()
    }

    /// Returns the children of `node`.
    ///
    /// Expanding a query node loads its forest on first use within the
    /// current refresh generation; later expansions reuse it.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError`] when loading the query fails.
    pub async fn children(&self, node: &TreeNode) -> Result<Vec<TreeNode>, TreeError> {
        match node {
            TreeNode::Query(query) => self.query_children(query).await,
            TreeNode::Item(item) => Ok(item.children()),
            TreeNode::NoOpenFolder | TreeNode::NoConnection | TreeNode::Unavailable(_) => {
                Ok(Vec::new())
            }
        }
    }

    /// Invalidates every cached forest.
    pub fn refresh(&self) {
        self.refresh.trigger();
    }

    /// Returns the cached forest for a query, if loaded in the current
    /// generation.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::Cache`] when the cache lock is poisoned.
    pub fn cached_forest(&self, query_id: &QueryId) -> Result<Option<Arc<QueryForest>>, TreeError> {
        let generation = self.refresh.generation();
        let cache = self
            .cache
            .read()
            .map_err(|err| TreeError::Cache(err.to_string()))?;
        if cache.generation != generation {
            return Ok(None);
        }
        Ok(cache.forests.get(query_id).cloned())
    }

    async fn query_children(&self, query: &Query) -> Result<Vec<TreeNode>, TreeError> {
        if let Some(forest) = self.cached_forest(&query.id)? {
            return Ok(item_nodes(&forest, forest.roots()));
        }

        let generation = self.refresh.generation();
        let forest = match self.loader.load(query).await? {
            LoadedQuery::Forest(forest) => Arc::new(forest),
            LoadedQuery::Skipped(missing) => return Ok(vec![TreeNode::Unavailable(missing)]),
        };
        self.store_forest(generation, &forest)?;
        Ok(item_nodes(&forest, forest.roots()))
    }

    fn store_forest(&self, generation: u64, forest: &Arc<QueryForest>) -> Result<(), TreeError> {
        let mut cache = self
            .cache
            .write()
            .map_err(|err| TreeError::Cache(err.to_string()))?;
        let current = self.refresh.generation();
        if current != generation {
            tracing::debug!(
                query = %forest.query().id,
                loaded_in = generation,
                current,
                "discarding forest from superseded refresh"
            );
            return Ok(());
        }
        if cache.generation != generation {
            cache.forests.clear();
            cache.generation = generation;
        }
        cache
            .forests
            .insert(forest.query().id.clone(), Arc::clone(forest));
        Ok(())
    }
}
