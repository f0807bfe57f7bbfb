//! Tests for forest assembly and the lazily expanded board tree.

use super::support::{assigned_to, id, remote_item, scope, work_item};
use crate::work_item::{
    adapters::memory::{InMemoryGitRemote, InMemoryWorkItemStore},
    domain::{MissingContext, ProjectScope, Query, QueryId, QueryResult, WorkItem},
    ports::RemoteServiceError,
    services::{
        BoardTree, ForestLoader, ItemHydrator, LoadedQuery, QueryExecutor, QueryForest,
        ReadPipeline, RefreshSignal, TreeContext, TreeNode,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use std::sync::Arc;

type Pipeline = ReadPipeline<InMemoryWorkItemStore, InMemoryGitRemote, DefaultClock>;

fn query(value: &str, name: &str) -> Query {
    Query::new(QueryId::new(value).expect("valid query id"), name)
}

fn context(workspace_open: bool, connected: bool) -> TreeContext {
    TreeContext {
        workspace_open,
        connected,
        queries: vec![query("mine", "My work"), query("team", "Team backlog")],
    }
}

fn pipeline(
    store: &Arc<InMemoryWorkItemStore>,
    scope: Result<ProjectScope, MissingContext>,
) -> Arc<Pipeline> {
    Arc::new(ReadPipeline::new(
        QueryExecutor::new(Arc::clone(store), scope),
        ItemHydrator::new(
            Arc::clone(store),
            Arc::new(InMemoryGitRemote::new()),
            Arc::new(DefaultClock),
        ),
    ))
}

#[fixture]
fn store() -> Arc<InMemoryWorkItemStore> {
    let store = InMemoryWorkItemStore::new();
    store
        .insert_item(assigned_to(
            remote_item(1, "Epic", None),
            "ada@contoso.com",
            None,
        ))
        .expect("insert item");
    store
        .insert_item(remote_item(2, "Story", Some(1)))
        .expect("insert item");
    store
        .insert_item(remote_item(3, "Task", Some(2)))
        .expect("insert item");
    store
        .insert_item(remote_item(4, "Loose bug", None))
        .expect("insert item");
    store
        .set_query(
            QueryId::new("mine").expect("valid query id"),
            QueryResult::hierarchical([
                (None, id(1)),
                (Some(id(1)), id(2)),
                (Some(id(2)), id(3)),
                (None, id(4)),
            ]),
        )
        .expect("register query");
    Arc::new(store)
}

fn labels(nodes: &[TreeNode]) -> Vec<String> {
    nodes.iter().map(TreeNode::label).collect()
}

fn item_ids(nodes: &[TreeNode]) -> Vec<u32> {
    nodes
        .iter()
        .filter_map(TreeNode::work_item)
        .map(|item| item.id().value())
        .collect()
}

// ── QueryForest ─────────────────────────────────────────────────────

#[rstest]
fn forest_indexes_children_by_parent() {
    let forest = QueryForest::from_items(
        query("mine", "My work"),
        vec![
            work_item(1, "Epic", None),
            work_item(2, "Story", Some(1)),
            work_item(3, "Other story", Some(1)),
            work_item(4, "Orphan", Some(99)),
        ],
        Utc::now(),
    );

    let roots: Vec<u32> = forest.roots().iter().map(|item| item.id().value()).collect();
    let children: Vec<u32> = forest
        .children_of(id(1))
        .iter()
        .map(|item| item.id().value())
        .collect();
    assert_eq!(roots, vec![1]);
    assert_eq!(children, vec![2, 3]);
    assert!(forest.has_children(id(1)));
    assert!(!forest.has_children(id(2)));
    assert_eq!(forest.get(id(4)).map(WorkItem::title), Some("Orphan"));
    assert_eq!(forest.items().count(), 4);
}

// ── Roots ───────────────────────────────────────────────────────────

#[rstest]
#[case::no_workspace(false, true, vec!["Open a folder to use the board"])]
#[case::no_workspace_no_connection(false, false, vec!["Open a folder to use the board"])]
#[case::no_connection(true, false, vec!["Click to connect to an organization"])]
#[case::ready(true, true, vec!["My work", "Team backlog"])]
fn roots_follow_host_state(
    store: Arc<InMemoryWorkItemStore>,
    #[case] workspace_open: bool,
    #[case] connected: bool,
    #[case] expected: Vec<&str>,
) {
    let tree = BoardTree::new(
        pipeline(&store, Ok(scope())),
        context(workspace_open, connected),
        RefreshSignal::new(),
    );
    assert_eq!(labels(&tree.roots()), expected);
}

#[rstest]
fn only_query_nodes_are_expandable_at_top_level(store: Arc<InMemoryWorkItemStore>) {
    let tree = BoardTree::new(
        pipeline(&store, Ok(scope())),
        context(true, false),
        RefreshSignal::new(),
    );
    assert!(tree.roots().iter().all(|node| !node.is_expandable()));
    assert!(TreeNode::Query(query("mine", "My work")).is_expandable());
}

// ── Expansion ───────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expanding_nodes_walks_the_parent_index(store: Arc<InMemoryWorkItemStore>) {
    let tree = BoardTree::new(
        pipeline(&store, Ok(scope())),
        context(true, true),
        RefreshSignal::new(),
    );
    let mine = TreeNode::Query(query("mine", "My work"));

    let roots = tree.children(&mine).await.expect("roots load");
    assert_eq!(item_ids(&roots), vec![1, 4]);

    let epic = roots.first().expect("epic");
    assert!(epic.is_expandable());
    let stories = tree.children(epic).await.expect("stories");
    assert_eq!(item_ids(&stories), vec![2]);

    let tasks = tree
        .children(stories.first().expect("story"))
        .await
        .expect("tasks");
    assert_eq!(item_ids(&tasks), vec![3]);
    assert!(!tasks.first().expect("task").is_expandable());
    assert!(!roots.get(1).expect("bug").is_expandable());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn item_nodes_present_glyph_assignee_and_state(store: Arc<InMemoryWorkItemStore>) {
    let tree = BoardTree::new(
        pipeline(&store, Ok(scope())),
        context(true, true),
        RefreshSignal::new(),
    );
    let roots = tree
        .children(&TreeNode::Query(query("mine", "My work")))
        .await
        .expect("roots load");

    let Some(TreeNode::Item(epic)) = roots.first() else {
        panic!("expected an item node");
    };
    assert_eq!(epic.label(), "\u{1f533} 1 Epic");
    assert_eq!(
        epic.description(),
        "ada@contoso.com (display)  \u{2022}  New"
    );
    assert_eq!(
        epic.tooltip(),
        "Task: 1 Epic\nAssigned to: ada@contoso.com (display)\nState: New"
    );

    let Some(TreeNode::Item(bug)) = roots.get(1) else {
        panic!("expected an item node");
    };
    assert_eq!(bug.description(), "Unassigned  \u{2022}  New");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn forests_are_cached_until_refresh(store: Arc<InMemoryWorkItemStore>) {
    let refresh = RefreshSignal::new();
    let tree = BoardTree::new(
        pipeline(&store, Ok(scope())),
        context(true, true),
        refresh.clone(),
    );
    let mine = TreeNode::Query(query("mine", "My work"));
    let mine_id = QueryId::new("mine").expect("valid query id");

    tree.children(&mine).await.expect("first load");
    tree.children(&mine).await.expect("cached load");
    assert_eq!(store.calls().expect("calls").run_query, 1);
    assert_eq!(store.calls().expect("calls").get_work_items, 1);
    assert!(tree.cached_forest(&mine_id).expect("cache").is_some());

    refresh.trigger();
    assert!(tree.cached_forest(&mine_id).expect("cache").is_none());

    tree.children(&mine).await.expect("reload");
    assert_eq!(store.calls().expect("calls").run_query, 2);
    assert_eq!(store.calls().expect("calls").get_work_items, 2);

    tree.refresh();
    tree.children(&mine).await.expect("reload after tree refresh");
    assert_eq!(store.calls().expect("calls").run_query, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn incomplete_context_yields_an_unavailable_node(store: Arc<InMemoryWorkItemStore>) {
    let tree = BoardTree::new(
        pipeline(&store, Err(MissingContext::Repository)),
        context(true, true),
        RefreshSignal::new(),
    );

    let nodes = tree
        .children(&TreeNode::Query(query("mine", "My work")))
        .await
        .expect("skips");

    assert_eq!(labels(&nodes), vec!["No repository configured"]);
    assert!(!nodes.iter().any(TreeNode::is_expandable));
    assert_eq!(store.calls().expect("calls").run_query, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn load_failure_is_reported(store: Arc<InMemoryWorkItemStore>) {
    store
        .set_failure(Some(RemoteServiceError::Status {
            status: 503,
            body: "unavailable".to_owned(),
        }))
        .expect("set failure");
    let tree = BoardTree::new(
        pipeline(&store, Ok(scope())),
        context(true, true),
        RefreshSignal::new(),
    );

    let result = tree
        .children(&TreeNode::Query(query("mine", "My work")))
        .await;

    assert!(result.is_err());
    assert!(
        tree.cached_forest(&QueryId::new("mine").expect("valid query id"))
            .expect("cache")
            .is_none()
    );
}

/// Loader that triggers a refresh while its pass is in flight.
struct SupersededLoader {
    refresh: RefreshSignal,
}

#[async_trait]
impl ForestLoader for SupersededLoader {
    async fn load(&self, loaded: &Query) -> Result<LoadedQuery, RemoteServiceError> {
        self.refresh.trigger();
        Ok(LoadedQuery::Forest(QueryForest::from_items(
            loaded.clone(),
            vec![work_item(1, "Stale", None)],
            Utc::now(),
        )))
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn superseded_pass_is_returned_but_not_cached() {
    let refresh = RefreshSignal::new();
    let loader = Arc::new(SupersededLoader {
        refresh: refresh.clone(),
    });
    let tree = BoardTree::new(loader, context(true, true), refresh);

    let nodes = tree
        .children(&TreeNode::Query(query("mine", "My work")))
        .await
        .expect("loads");

    assert_eq!(item_ids(&nodes), vec![1]);
    assert!(
        tree.cached_forest(&QueryId::new("mine").expect("valid query id"))
            .expect("cache")
            .is_none()
    );
}
