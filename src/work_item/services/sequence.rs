//! Fail-fast sequence driver for lifecycle workflows.

use super::WorkflowError;
use crate::work_item::ports::{RemoteServiceError, VersionControlError};
use std::fmt;
use std::future::Future;
use thiserror::Error;

/// Lifecycle sequences the engine can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleSequence {
    /// Check out, sync and rebase the item's branch, then activate the item.
    StartWork,
    /// Push the item's branch, clean up locally, open a pull request and
    /// resolve the item.
    FinishWork,
    /// Check out the item's branch.
    Checkout,
    /// Create a remote branch for the item and link it.
    CreateBranch,
    /// Create a new work item.
    CreateWorkItem,
    /// Replace one field of a work item.
    UpdateField,
}

impl fmt::Display for LifecycleSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::StartWork => "start work",
            Self::FinishWork => "finish work",
            Self::Checkout => "checkout",
            Self::CreateBranch => "create branch",
            Self::CreateWorkItem => "create work item",
            Self::UpdateField => "update field",
        };
        f.write_str(label)
    }
}

/// Stage reached by a sequence.
///
/// A stage is recorded only after its step succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowStage {
    /// Remote refs were fetched.
    Fetched,
    /// The item's branch is checked out.
    CheckedOut,
    /// The checked-out branch was pulled.
    Synced,
    /// The branch was rebased onto the integration branch.
    Rebased,
    /// The item was assigned and moved to the in-progress state.
    ItemActivated,
    /// The branch was pushed.
    Pushed,
    /// The integration branch is checked out.
    SwitchedToIntegration,
    /// The local branch was deleted.
    BranchDeleted,
    /// The pull request page was handed to the opener.
    PullRequestOpened,
    /// The item was moved to the resolved state.
    ItemResolved,
    /// The integration branch head commit is known.
    HeadResolved,
    /// The remote branch ref was created.
    RefCreated,
    /// The branch was linked to the item.
    BranchLinked,
    /// A work item was created.
    ItemCreated,
    /// A field was replaced.
    FieldUpdated,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fetched => "fetch",
            Self::CheckedOut => "checkout",
            Self::Synced => "pull",
            Self::Rebased => "rebase",
            Self::ItemActivated => "activate item",
            Self::Pushed => "push",
            Self::SwitchedToIntegration => "switch to integration branch",
            Self::BranchDeleted => "delete branch",
            Self::PullRequestOpened => "open pull request",
            Self::ItemResolved => "resolve item",
            Self::HeadResolved => "resolve integration head",
            Self::RefCreated => "create ref",
            Self::BranchLinked => "link branch",
            Self::ItemCreated => "create item",
            Self::FieldUpdated => "update field",
        };
        f.write_str(label)
    }
}

/// Failure of a single step.
#[derive(Debug, Clone, Error)]
pub enum StepFailure {
    /// The version-control tool failed.
    #[error(transparent)]
    VersionControl(#[from] VersionControlError),
    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),
    /// The remote rejected a ref update.
    #[error("ref update for {name} was rejected: {status}")]
    RefRejected {
        /// Ref that was being updated.
        name: String,
        /// Remote status label.
        status: String,
    },
}

/// Stages a sequence reached, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReport {
    /// Sequence that ran.
    pub sequence: LifecycleSequence,
    /// Stages completed, in order.
    pub stages: Vec<WorkflowStage>,
}

/// Runs the steps of one sequence in order and stops at the first failure.
///
/// There is no rollback: a failed step leaves earlier effects in place and
/// the returned error lists the stages that completed.
#[derive(Debug)]
pub struct SequenceDriver {
    sequence: LifecycleSequence,
    completed: Vec<WorkflowStage>,
}

impl SequenceDriver {
    /// Starts a sequence with no completed stages.
    #[must_use]
    pub const fn new(sequence: LifecycleSequence) -> Self {
        Self {
            sequence,
            completed: Vec::new(),
        }
    }

    /// Awaits `step` and records `stage` if it succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StepFailed`] carrying the stages completed
    /// so far when `step` fails.
    pub async fn step<T, E, F>(&mut self, stage: WorkflowStage, step: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, E>> + Send,
        E: Into<StepFailure>,
    {
        match step.await {
            Ok(value) => {
                self.mark(stage);
                Ok(value)
            }
            Err(err) => {
                let source = err.into();
                tracing::warn!(
                    sequence = %self.sequence,
                    %stage,
                    error = %source,
                    "workflow step failed"
                );
                Err(WorkflowError::StepFailed {
                    sequence: self.sequence,
                    stage,
                    completed: self.completed.clone(),
                    source,
                })
            }
        }
    }

    /// Records a stage that cannot fail.
    pub fn mark(&mut self, stage: WorkflowStage) {
        tracing::debug!(sequence = %self.sequence, %stage, "workflow stage reached");
        self.completed.push(stage);
    }

    /// Ends the sequence.
    #[must_use]
    pub fn finish(self) -> WorkflowReport {
        tracing::info!(
            sequence = %self.sequence,
            stages = self.completed.len(),
            "workflow completed"
        );
        WorkflowReport {
            sequence: self.sequence,
            stages: self.completed,
        }
    }
}
