//! In-memory work item store for board tests.

use crate::work_item::{
    domain::{
        AvatarBlob, IdentityRef, JsonPatch, PatchOperation, ProjectScope, QueryId, QueryResult,
        RELATIONS_APPEND_PATH, RemoteWorkItem, WorkItemField, WorkItemFields, WorkItemId,
        WorkItemRelation,
    },
    ports::{RemoteResult, RemoteServiceError, WorkItemStore},
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

/// Number of calls made to each store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreCalls {
    /// `run_query` calls.
    pub run_query: usize,
    /// `get_work_items` calls.
    pub get_work_items: usize,
    /// `get_avatar` calls.
    pub get_avatar: usize,
    /// `update_work_item` calls.
    pub update_work_item: usize,
    /// `create_work_item` calls.
    pub create_work_item: usize,
}

/// Patch applied through [`WorkItemStore::update_work_item`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedUpdate {
    /// Item the patch targeted.
    pub id: WorkItemId,
    /// Submitted patch.
    pub patch: JsonPatch,
}

/// Thread-safe in-memory work item store.
///
/// Updates are applied to the stored items so later reads observe them.
/// Every call is counted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkItemStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    queries: HashMap<QueryId, QueryResult>,
    items: BTreeMap<WorkItemId, RemoteWorkItem>,
    avatars: HashMap<String, AvatarBlob>,
    updates: Vec<RecordedUpdate>,
    calls: StoreCalls,
    failure: Option<RemoteServiceError>,
}

fn lock_error(err: impl ToString) -> RemoteServiceError {
    RemoteServiceError::transport(std::io::Error::other(err.to_string()))
}

impl InMemoryWorkItemStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces an item.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn insert_item(&self, item: RemoteWorkItem) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.items.insert(item.id, item);
        Ok(())
    }

    /// Registers the result returned for a saved query.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_query(&self, id: QueryId, result: QueryResult) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.queries.insert(id, result);
        Ok(())
    }

    /// Registers the avatar served at `image_url`.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_avatar(&self, image_url: impl Into<String>, avatar: AvatarBlob) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.avatars.insert(image_url.into(), avatar);
        Ok(())
    }

    /// Makes every subsequent call fail with `failure`, or clears it.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_failure(&self, failure: Option<RemoteServiceError>) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failure = failure;
        Ok(())
    }

    /// Returns the call counters.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn calls(&self) -> RemoteResult<StoreCalls> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.calls)
    }

    /// Returns every update in submission order.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn updates(&self) -> RemoteResult<Vec<RecordedUpdate>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.updates.clone())
    }

    /// Returns a stored item.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn item(&self, id: WorkItemId) -> RemoteResult<Option<RemoteWorkItem>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.items.get(&id).cloned())
    }
}

impl StoreState {
    fn check_failure(&self) -> RemoteResult<()> {
        self.failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl WorkItemStore for InMemoryWorkItemStore {
    async fn run_query(
        &self,
        _scope: &ProjectScope,
        query_id: &QueryId,
    ) -> RemoteResult<QueryResult> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.run_query += 1;
        state.check_failure()?;
        state
            .queries
            .get(query_id)
            .cloned()
            .ok_or_else(|| RemoteServiceError::NotFound(format!("query {query_id}")))
    }

    async fn get_work_items(
        &self,
        _scope: &ProjectScope,
        ids: &[WorkItemId],
    ) -> RemoteResult<Vec<RemoteWorkItem>> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.get_work_items += 1;
        state.check_failure()?;
        // Returned in id order, not request order, like the remote service.
        Ok(state
            .items
            .values()
            .filter(|item| ids.contains(&item.id))
            .cloned()
            .collect())
    }

    async fn get_avatar(&self, image_url: &str) -> RemoteResult<AvatarBlob> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.get_avatar += 1;
        state.check_failure()?;
        state
            .avatars
            .get(image_url)
            .cloned()
            .ok_or_else(|| RemoteServiceError::NotFound(format!("avatar {image_url}")))
    }

    async fn update_work_item(
        &self,
        _scope: &ProjectScope,
        id: WorkItemId,
        patch: &JsonPatch,
    ) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.update_work_item += 1;
        state.check_failure()?;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| RemoteServiceError::NotFound(format!("work item {id}")))?;
        for operation in patch.operations() {
            apply_operation(item, operation)?;
        }
        state.updates.push(RecordedUpdate {
            id,
            patch: patch.clone(),
        });
        Ok(())
    }

    async fn create_work_item(
        &self,
        _scope: &ProjectScope,
        work_item_type: &str,
        patch: &JsonPatch,
    ) -> RemoteResult<WorkItemId> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.calls.create_work_item += 1;
        state.check_failure()?;
        let next = state
            .items
            .keys()
            .next_back()
            .map_or(1, |id| id.value().saturating_add(1));
        let id = WorkItemId::new(next)
            .map_err(|err| RemoteServiceError::Malformed(err.to_string()))?;
        let mut item = RemoteWorkItem {
            id,
            fields: WorkItemFields {
                id: Some(id),
                work_item_type: work_item_type.to_owned(),
                state: "New".to_owned(),
                ..WorkItemFields::default()
            },
            relations: Vec::new(),
            web_url: None,
        };
        for operation in patch.operations() {
            apply_operation(&mut item, operation)?;
        }
        state.items.insert(id, item);
        Ok(id)
    }
}

fn apply_operation(item: &mut RemoteWorkItem, operation: &PatchOperation) -> RemoteResult<()> {
    if operation.path == RELATIONS_APPEND_PATH {
        let relation: WorkItemRelation = serde_json::from_value(operation.value.clone())
            .map_err(|err| RemoteServiceError::Malformed(err.to_string()))?;
        item.relations.push(relation);
        return Ok(());
    }

    let reference = operation
        .path
        .strip_prefix("/fields/")
        .ok_or_else(|| {
            RemoteServiceError::Malformed(format!("unsupported path {}", operation.path))
        })?;
    let field = WorkItemField::try_from(reference)
        .map_err(|err| RemoteServiceError::Malformed(err.to_string()))?;
    let text = || operation.value.as_str().map(str::to_owned);
    let fields = &mut item.fields;
    match field {
        WorkItemField::Title => fields.title = text().unwrap_or_default(),
        WorkItemField::WorkItemType => fields.work_item_type = text().unwrap_or_default(),
        WorkItemField::State => fields.state = text().unwrap_or_default(),
        WorkItemField::Description => fields.description = text(),
        WorkItemField::AcceptanceCriteria => fields.acceptance_criteria = text(),
        WorkItemField::Reason => fields.reason = text(),
        WorkItemField::AssignedTo => {
            fields.assigned_to = text().map(|name| IdentityRef {
                display_name: name.clone(),
                unique_name: name,
                image_url: None,
            });
        }
        WorkItemField::StoryPoints => fields.story_points = operation.value.as_f64(),
        WorkItemField::Parent => {
            fields.parent = operation
                .value
                .as_i64()
                .and_then(|raw| WorkItemId::try_from(raw).ok());
        }
        WorkItemField::Id => {
            return Err(RemoteServiceError::Malformed(
                "System.Id is read-only".to_owned(),
            ));
        }
    }
    Ok(())
}
