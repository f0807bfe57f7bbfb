//! Recording version-control adapter for workflow tests.

use crate::work_item::{
    domain::BranchName,
    ports::{VersionControl, VersionControlError, VersionControlResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Version-control call observed by [`RecordingVersionControl`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VcsCall {
    /// `fetch`.
    Fetch,
    /// `checkout` of the named branch.
    Checkout(String),
    /// `pull`.
    Pull,
    /// `push`.
    Push,
    /// `delete_branch` of the named branch.
    DeleteBranch(String),
    /// `rebase` onto the named upstream.
    Rebase(String),
}

impl VcsCall {
    fn command(&self) -> String {
        match self {
            Self::Fetch => "git fetch".to_owned(),
            Self::Checkout(branch) => format!("git checkout {branch}"),
            Self::Pull => "git pull".to_owned(),
            Self::Push => "git push".to_owned(),
            Self::DeleteBranch(branch) => format!("git branch -d {branch}"),
            Self::Rebase(onto) => format!("git rebase {onto}"),
        }
    }
}

/// Version-control adapter that records calls instead of running git.
///
/// Calls registered with [`RecordingVersionControl::fail_on`] fail with the
/// given detail; failed calls are recorded too.
#[derive(Debug, Clone, Default)]
pub struct RecordingVersionControl {
    state: Arc<RwLock<RecordingState>>,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<VcsCall>,
    failures: HashMap<VcsCall, String>,
    remotes: HashMap<String, String>,
}

fn lock_error(err: impl ToString) -> VersionControlError {
    VersionControlError::unavailable(std::io::Error::other(err.to_string()))
}

impl RecordingVersionControl {
    /// Creates an adapter where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `call` fail with `detail`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionControlError::Unavailable`] when lock acquisition
    /// fails.
    pub fn fail_on(&self, call: VcsCall, detail: impl Into<String>) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.failures.insert(call, detail.into());
        Ok(())
    }

    /// Configures the URL of a remote.
    ///
    /// # Errors
    ///
    /// Returns [`VersionControlError::Unavailable`] when lock acquisition
    /// fails.
    pub fn set_remote_url(
        &self,
        remote: impl Into<String>,
        url: impl Into<String>,
    ) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.remotes.insert(remote.into(), url.into());
        Ok(())
    }

    /// Returns every call in order.
    ///
    /// # Errors
    ///
    /// Returns [`VersionControlError::Unavailable`] when lock acquisition
    /// fails.
    pub fn calls(&self) -> VersionControlResult<Vec<VcsCall>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.calls.clone())
    }

    fn record(&self, call: VcsCall) -> VersionControlResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let failure = state.failures.get(&call).cloned();
        let command = call.command();
        state.calls.push(call);
        failure.map_or(Ok(()), |detail| {
            Err(VersionControlError::CommandFailed { command, detail })
        })
    }
}

#[async_trait]
impl VersionControl for RecordingVersionControl {
    async fn fetch(&self) -> VersionControlResult<()> {
        self.record(VcsCall::Fetch)
    }

    async fn checkout(&self, branch: &BranchName) -> VersionControlResult<()> {
        self.record(VcsCall::Checkout(branch.as_str().to_owned()))
    }

    async fn pull(&self) -> VersionControlResult<()> {
        self.record(VcsCall::Pull)
    }

    async fn push(&self) -> VersionControlResult<()> {
        self.record(VcsCall::Push)
    }

    async fn delete_branch(&self, branch: &BranchName) -> VersionControlResult<()> {
        self.record(VcsCall::DeleteBranch(branch.as_str().to_owned()))
    }

    async fn rebase(&self, onto: &str) -> VersionControlResult<()> {
        self.record(VcsCall::Rebase(onto.to_owned()))
    }

    async fn remote_url(&self, remote: &str) -> VersionControlResult<Option<String>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.remotes.get(remote).cloned())
    }
}
