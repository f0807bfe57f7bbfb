//! Query executor: saved query to ordered id list.

use crate::work_item::{
    domain::{MissingContext, ProjectScope, QueryId, WorkItemId},
    ports::{RemoteServiceError, WorkItemStore},
};
use std::sync::Arc;

/// Result of running a saved query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The query ran; ids are in result order.
    Items(Vec<WorkItemId>),
    /// The query was not run because part of the context is missing.
    Skipped(MissingContext),
}

impl QueryOutcome {
    /// Returns the ids, treating a skipped query as empty.
    #[must_use]
    pub fn into_ids(self) -> Vec<WorkItemId> {
        match self {
            Self::Items(ids) => ids,
            Self::Skipped(_) => Vec::new(),
        }
    }
}

/// Runs saved queries against the remote store.
#[derive(Clone)]
pub struct QueryExecutor<S>
where
    S: WorkItemStore,
{
    store: Arc<S>,
    scope: Result<ProjectScope, MissingContext>,
}

impl<S> QueryExecutor<S>
where
    S: WorkItemStore,
{
    /// Creates an executor for the given scope, or for a context that is
    /// known to be incomplete.
    #[must_use]
    pub const fn new(store: Arc<S>, scope: Result<ProjectScope, MissingContext>) -> Self {
        Self { store, scope }
    }

    /// Runs a query and normalizes both result shapes into one id list.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError`] when the remote call fails. Nothing is
    /// retried.
    pub async fn execute(&self, query_id: &QueryId) -> Result<QueryOutcome, RemoteServiceError> {
        let scope = match &self.scope {
            Ok(scope) => scope,
            Err(missing) => {
                tracing::warn!(
                    query = %query_id,
                    missing = %missing,
                    "query skipped: context incomplete"
                );
                return Ok(QueryOutcome::Skipped(*missing));
            }
        };

        let result = self.store.run_query(scope, query_id).await?;
        let ids = result.into_ids();
        tracing::debug!(query = %query_id, count = ids.len(), "query executed");
        Ok(QueryOutcome::Items(ids))
    }

    /// Returns the scope, if the context is complete.
    #[must_use]
    pub fn scope(&self) -> Result<&ProjectScope, MissingContext> {
        self.scope.as_ref().map_err(|missing| *missing)
    }
}
