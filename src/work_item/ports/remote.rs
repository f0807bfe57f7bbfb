//! Remote service ports: the work item store and the hosted git API.

use crate::work_item::domain::{
    AvatarBlob, BranchName, BranchStats, JsonPatch, ProjectScope, QueryId, QueryResult,
    RemoteWorkItem, RepositoryId, WorkItemId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Placeholder object id meaning "the ref must not exist yet".
pub const ZERO_OBJECT_ID: &str = "0000000000000000000000000000000000000000";

/// Result type for remote service operations.
pub type RemoteResult<T> = Result<T, RemoteServiceError>;

/// Work item tracking contract.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    /// Runs a saved query and returns its raw result.
    async fn run_query(&self, scope: &ProjectScope, query_id: &QueryId)
    -> RemoteResult<QueryResult>;

    /// Fetches items by id with relations expanded, in one request.
    ///
    /// The store may return items in any order and may omit ids.
    async fn get_work_items(
        &self,
        scope: &ProjectScope,
        ids: &[WorkItemId],
    ) -> RemoteResult<Vec<RemoteWorkItem>>;

    /// Fetches an authenticated avatar image.
    async fn get_avatar(&self, image_url: &str) -> RemoteResult<AvatarBlob>;

    /// Applies a patch to an existing item.
    async fn update_work_item(
        &self,
        scope: &ProjectScope,
        id: WorkItemId,
        patch: &JsonPatch,
    ) -> RemoteResult<()>;

    /// Creates an item of the given type and returns its id.
    async fn create_work_item(
        &self,
        scope: &ProjectScope,
        work_item_type: &str,
        patch: &JsonPatch,
    ) -> RemoteResult<WorkItemId>;
}

/// Request to move a remote ref from one object to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    /// Fully qualified ref name.
    pub name: String,
    /// Object the ref must point to afterwards.
    pub new_object_id: String,
    /// Object the ref must point to beforehand.
    pub old_object_id: String,
}

impl RefUpdate {
    /// Builds the update that creates `branch` at `head`.
    #[must_use]
    pub fn create_branch(branch: &BranchName, head: impl Into<String>) -> Self {
        Self {
            name: branch.to_ref_name(),
            new_object_id: head.into(),
            old_object_id: ZERO_OBJECT_ID.to_owned(),
        }
    }
}

/// Outcome of a ref update as reported remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdateOutcome {
    /// Ref that was updated.
    pub name: String,
    /// Whether the update was applied.
    pub success: bool,
    /// Remote status label, for example `succeeded` or `staleOldObjectId`.
    pub status: String,
}

/// Hosted git API contract.
#[async_trait]
pub trait GitRemote: Send + Sync {
    /// Returns statistics for a branch relative to the default branch.
    async fn get_branch(
        &self,
        scope: &ProjectScope,
        repository: &RepositoryId,
        name: &BranchName,
    ) -> RemoteResult<BranchStats>;

    /// Applies a single ref update.
    async fn update_ref(
        &self,
        scope: &ProjectScope,
        repository: &RepositoryId,
        update: &RefUpdate,
    ) -> RemoteResult<RefUpdateOutcome>;
}

/// Errors returned by remote service adapters.
#[derive(Debug, Clone, Error)]
pub enum RemoteServiceError {
    /// The request could not be sent or its body read.
    #[error("remote transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),

    /// The service answered with a non-success status.
    #[error("remote request failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The response did not match the expected shape.
    #[error("remote response was malformed: {0}")]
    Malformed(String),

    /// The requested entity does not exist.
    #[error("remote entity not found: {0}")]
    NotFound(String),
}

impl RemoteServiceError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
