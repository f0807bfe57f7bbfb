//! Ports towards the interactive host: opening URLs and confirming input.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Opens URLs in the user's browser.
#[async_trait]
pub trait UrlOpener: Send + Sync {
    /// Hands `url` to the host; success only means the hand-off happened.
    async fn open(&self, url: &str) -> Result<(), OpenerError>;
}

/// Error returned when a URL could not be handed to the host.
#[derive(Debug, Clone, Error)]
#[error("failed to open {url}: {source}")]
pub struct OpenerError {
    /// URL that was being opened.
    pub url: String,
    /// Underlying failure.
    #[source]
    pub source: Arc<dyn std::error::Error + Send + Sync>,
}

impl OpenerError {
    /// Wraps a failure for `url`.
    pub fn new(
        url: impl Into<String>,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            url: url.into(),
            source: Arc::new(err),
        }
    }
}

/// Asks the user to confirm or edit a proposed branch name.
#[async_trait]
pub trait BranchNamePrompt: Send + Sync {
    /// Returns the accepted name, or `None` when the user cancels.
    async fn confirm_branch_name(&self, proposed: &str) -> Option<String>;
}
