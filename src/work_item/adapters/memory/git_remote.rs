//! In-memory hosted git API for board tests.

use crate::work_item::{
    domain::{BranchName, BranchStats, ProjectScope, RepositoryId},
    ports::{GitRemote, RefUpdate, RefUpdateOutcome, RemoteResult, RemoteServiceError},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory hosted git API.
///
/// Created refs become visible to later `get_branch` calls. Branch lookups
/// are counted so memoization can be observed.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGitRemote {
    state: Arc<RwLock<GitRemoteState>>,
}

#[derive(Debug, Default)]
struct GitRemoteState {
    branches: HashMap<(RepositoryId, String), BranchStats>,
    ref_updates: Vec<(RepositoryId, RefUpdate)>,
    branch_lookups: usize,
    rejection: Option<String>,
    lookup_failure: Option<RemoteServiceError>,
}

fn lock_error(err: impl ToString) -> RemoteServiceError {
    RemoteServiceError::transport(std::io::Error::other(err.to_string()))
}

impl InMemoryGitRemote {
    /// Creates a remote with no branches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a branch.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn insert_branch(&self, repository: RepositoryId, stats: BranchStats) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state
            .branches
            .insert((repository, stats.name.clone()), stats);
        Ok(())
    }

    /// Makes later ref updates report failure with `status`, or clears it.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn reject_ref_updates(&self, status: Option<String>) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.rejection = status;
        Ok(())
    }

    /// Makes later `get_branch` calls fail with `failure`, or clears it.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn set_lookup_failure(&self, failure: Option<RemoteServiceError>) -> RemoteResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.lookup_failure = failure;
        Ok(())
    }

    /// Returns the number of `get_branch` calls.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn branch_lookups(&self) -> RemoteResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.branch_lookups)
    }

    /// Returns every submitted ref update.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn ref_updates(&self) -> RemoteResult<Vec<(RepositoryId, RefUpdate)>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.ref_updates.clone())
    }
}

#[async_trait]
impl GitRemote for InMemoryGitRemote {
    async fn get_branch(
        &self,
        _scope: &ProjectScope,
        repository: &RepositoryId,
        name: &BranchName,
    ) -> RemoteResult<BranchStats> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.branch_lookups += 1;
        if let Some(failure) = state.lookup_failure.clone() {
            return Err(failure);
        }
        state
            .branches
            .get(&(repository.clone(), name.as_str().to_owned()))
            .cloned()
            .ok_or_else(|| RemoteServiceError::NotFound(format!("branch {name} in {repository}")))
    }

    async fn update_ref(
        &self,
        _scope: &ProjectScope,
        repository: &RepositoryId,
        update: &RefUpdate,
    ) -> RemoteResult<RefUpdateOutcome> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.ref_updates.push((repository.clone(), update.clone()));
        if let Some(status) = state.rejection.clone() {
            return Ok(RefUpdateOutcome {
                name: update.name.clone(),
                success: false,
                status,
            });
        }

        let short_name = update
            .name
            .strip_prefix("refs/heads/")
            .unwrap_or(&update.name);
        state.branches.insert(
            (repository.clone(), short_name.to_owned()),
            BranchStats {
                name: short_name.to_owned(),
                ahead_count: 0,
                behind_count: 0,
                commit_id: Some(update.new_object_id.clone()),
            },
        );
        Ok(RefUpdateOutcome {
            name: update.name.clone(),
            success: true,
            status: "succeeded".to_owned(),
        })
    }
}
