//! Recording opener and scripted prompt for workflow tests.

use crate::work_item::ports::{BranchNamePrompt, OpenerError, UrlOpener};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// URL opener that records URLs instead of launching a browser.
#[derive(Debug, Clone, Default)]
pub struct RecordingUrlOpener {
    opened: Arc<Mutex<Vec<String>>>,
    failing: bool,
}

impl RecordingUrlOpener {
    /// Creates an opener that accepts every URL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an opener that records every URL and then reports failure.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            opened: Arc::default(),
            failing: true,
        }
    }

    /// Returns the URLs handed over so far.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UrlOpener for RecordingUrlOpener {
    async fn open(&self, url: &str) -> Result<(), OpenerError> {
        self.opened
            .lock()
            .map_err(|err| OpenerError::new(url, std::io::Error::other(err.to_string())))?
            .push(url.to_owned());
        if self.failing {
            return Err(OpenerError::new(
                url,
                std::io::Error::other("no browser available"),
            ));
        }
        Ok(())
    }
}

/// Prompt that answers with a fixed reply and records what it was offered.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBranchNamePrompt {
    reply: Reply,
    offered: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone, Default)]
enum Reply {
    #[default]
    Accept,
    Replace(String),
    Cancel,
}

impl ScriptedBranchNamePrompt {
    /// Accepts the proposed name unchanged.
    #[must_use]
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Replaces the proposed name with `name`.
    #[must_use]
    pub fn replying(name: impl Into<String>) -> Self {
        Self {
            reply: Reply::Replace(name.into()),
            offered: Arc::default(),
        }
    }

    /// Dismisses the prompt.
    #[must_use]
    pub fn cancelling() -> Self {
        Self {
            reply: Reply::Cancel,
            offered: Arc::default(),
        }
    }

    /// Returns the names the prompt was offered.
    #[must_use]
    pub fn offered(&self) -> Vec<String> {
        self.offered
            .lock()
            .map(|names| names.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BranchNamePrompt for ScriptedBranchNamePrompt {
    async fn confirm_branch_name(&self, proposed: &str) -> Option<String> {
        if let Ok(mut offered) = self.offered.lock() {
            offered.push(proposed.to_owned());
        }
        match &self.reply {
            Reply::Accept => Some(proposed.to_owned()),
            Reply::Replace(name) => Some(name.clone()),
            Reply::Cancel => None,
        }
    }
}
