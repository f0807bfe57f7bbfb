//! Local version-control port.

use crate::work_item::domain::BranchName;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for version-control operations.
pub type VersionControlResult<T> = Result<T, VersionControlError>;

/// Operations on the single tracked working tree.
///
/// Every call mutates the shared checkout; callers issue them one at a time.
#[async_trait]
pub trait VersionControl: Send + Sync {
    /// Fetches remote refs.
    async fn fetch(&self) -> VersionControlResult<()>;

    /// Checks out a local or remote-tracking branch by name.
    async fn checkout(&self, branch: &BranchName) -> VersionControlResult<()>;

    /// Pulls the checked-out branch.
    async fn pull(&self) -> VersionControlResult<()>;

    /// Pushes the checked-out branch.
    async fn push(&self) -> VersionControlResult<()>;

    /// Deletes a local branch.
    async fn delete_branch(&self, branch: &BranchName) -> VersionControlResult<()>;

    /// Rebases the checked-out branch onto `onto`, for example
    /// `origin/master`.
    async fn rebase(&self, onto: &str) -> VersionControlResult<()>;

    /// Returns the fetch URL of a remote, if configured.
    async fn remote_url(&self, remote: &str) -> VersionControlResult<Option<String>>;
}

/// Errors returned by version-control adapters.
#[derive(Debug, Clone, Error)]
pub enum VersionControlError {
    /// The tool ran and reported failure.
    #[error("`{command}` failed: {detail}")]
    CommandFailed {
        /// Rendered command line.
        command: String,
        /// Tool output, stderr preferred.
        detail: String,
    },

    /// The tool could not be started.
    #[error("version control tool unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl VersionControlError {
    /// Wraps a spawn failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }

    /// Returns the text shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CommandFailed { detail, .. } => detail.clone(),
            Self::Unavailable(err) => err.to_string(),
        }
    }
}
