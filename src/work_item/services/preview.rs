//! Preview session: the single item detail surface and its actions.

use super::{CreatedBranch, WorkflowEngine, WorkflowError, WorkflowReport};
use crate::work_item::{
    domain::{BranchName, WorkItem, WorkItemField},
    ports::{BranchNamePrompt, GitRemote, UrlOpener, VersionControl, WorkItemStore},
};
use std::sync::Arc;

/// Action requested from the detail surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewAction {
    /// Start work on the displayed item.
    StartWork,
    /// Finish work on the displayed item.
    FinishWork,
    /// Check out the displayed item's branch.
    Checkout,
    /// Create and link a branch for the displayed item.
    CreateBranch,
    /// Replace a field of the displayed item.
    UpdateField {
        /// Field to replace.
        field: WorkItemField,
        /// New value; Markdown for rich-text fields.
        value: String,
    },
}

/// Result of a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// A sequence completed.
    Completed(WorkflowReport),
    /// A branch was created and linked.
    BranchCreated(CreatedBranch),
}

/// Session for the detail surface.
///
/// Created when the surface opens and dropped when it closes. Holds the
/// item currently displayed; actions act on that item.
pub struct PreviewSession<V, S, G, O>
where
    V: VersionControl,
    S: WorkItemStore,
    G: GitRemote,
    O: UrlOpener,
{
    engine: Arc<WorkflowEngine<V, S, G, O>>,
    prompt: Arc<dyn BranchNamePrompt>,
    item: WorkItem,
}

impl<V, S, G, O> PreviewSession<V, S, G, O>
where
    V: VersionControl,
    S: WorkItemStore,
    G: GitRemote,
    O: UrlOpener,
{
    /// Opens the surface on `item`.
    #[must_use]
    pub fn open(
        engine: Arc<WorkflowEngine<V, S, G, O>>,
        prompt: Arc<dyn BranchNamePrompt>,
        item: WorkItem,
    ) -> Self {
        tracing::debug!(item = %item.id(), "preview opened");
        Self {
            engine,
            prompt,
            item,
        }
    }

    /// Replaces the displayed item.
    pub fn show(&mut self, item: WorkItem) {
        tracing::debug!(item = %item.id(), "preview switched item");
        self.item = item;
    }

    /// Returns the displayed item.
    #[must_use]
    pub const fn item(&self) -> &WorkItem {
        &self.item
    }

    /// Runs `action` against the displayed item.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingBranch`] when the action needs a
    /// linked branch and the item has none, or the engine's error.
    pub async fn dispatch(&self, action: PreviewAction) -> Result<PreviewOutcome, WorkflowError> {
        let id = self.item.id();
        let report = match action {
            PreviewAction::StartWork => self.engine.start_work(id, self.branch()?).await?,
            PreviewAction::FinishWork => self.engine.finish_work(id, self.branch()?).await?,
            PreviewAction::Checkout => self.engine.checkout(self.branch()?).await?,
            PreviewAction::CreateBranch => {
                let created = self
                    .engine
                    .create_branch(id, self.item.title(), self.prompt.as_ref())
                    .await?;
                return Ok(PreviewOutcome::BranchCreated(created));
            }
            PreviewAction::UpdateField { field, value } => {
                self.engine.update_field(id, field, &value).await?
            }
        };
        Ok(PreviewOutcome::Completed(report))
    }

    /// Closes the surface.
    pub fn close(self) {
        tracing::debug!(item = %self.item.id(), "preview closed");
    }

    fn branch(&self) -> Result<&BranchName, WorkflowError> {
        self.item
            .branch()
            .map(|branch| branch.name())
            .ok_or(WorkflowError::MissingBranch(self.item.id()))
    }
}
