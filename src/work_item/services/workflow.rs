//! Workflow engine: lifecycle sequences across git and the remote board.

use super::{
    LifecycleSequence, RefreshSignal, SequenceDriver, StepFailure, WorkflowReport, WorkflowStage,
};
use crate::work_item::{
    domain::{
        BranchLink, BranchName, JsonPatch, PatchOperation, URI_COMPONENT, WorkItemDomainError,
        WorkItemField, WorkItemId, WorkItemRelation, WorkflowContext, commit_mention,
        propose_branch_name, render_rich_text,
    },
    ports::{
        BranchNamePrompt, GitRemote, RefUpdate, RemoteServiceError, UrlOpener, VersionControl,
        VersionControlError, WorkItemStore,
    },
};
use percent_encoding::utf8_percent_encode;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by the workflow engine.
#[derive(Debug, Clone, Error)]
pub enum WorkflowError {
    /// A step failed; earlier steps are not undone.
    #[error("{sequence} failed at {stage}: {source}")]
    StepFailed {
        /// Sequence that was running.
        sequence: LifecycleSequence,
        /// Stage whose step failed.
        stage: WorkflowStage,
        /// Stages that completed before the failure.
        completed: Vec<WorkflowStage>,
        /// Step failure.
        #[source]
        source: StepFailure,
    },

    /// The user cancelled the branch name prompt.
    #[error("branch creation cancelled")]
    Cancelled,

    /// The item has no linked branch.
    #[error("work item {0} has no linked branch")]
    MissingBranch(WorkItemId),

    /// Input failed domain validation.
    #[error(transparent)]
    InvalidInput(#[from] WorkItemDomainError),
}

impl WorkflowError {
    /// Returns the stages completed before the failure.
    #[must_use]
    pub fn completed_stages(&self) -> &[WorkflowStage] {
        match self {
            Self::StepFailed { completed, .. } => completed,
            Self::Cancelled | Self::MissingBranch(_) | Self::InvalidInput(_) => &[],
        }
    }
}

/// Branch created for a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBranch {
    /// Name the user confirmed.
    pub branch: BranchName,
    /// Stages reached.
    pub report: WorkflowReport,
}

/// Work item created on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWorkItem {
    /// Identifier assigned remotely.
    pub id: WorkItemId,
    /// Stages reached.
    pub report: WorkflowReport,
}

/// Drives lifecycle sequences against the working tree and the board.
///
/// Each operation runs its steps strictly in order, stops at the first
/// failing step and triggers the refresh signal only when every step
/// succeeded.
pub struct WorkflowEngine<V, S, G, O>
where
    V: VersionControl,
    S: WorkItemStore,
    G: GitRemote,
    O: UrlOpener,
{
    vcs: Arc<V>,
    store: Arc<S>,
    git: Arc<G>,
    opener: Arc<O>,
    context: WorkflowContext,
    refresh: RefreshSignal,
}

impl<V, S, G, O> WorkflowEngine<V, S, G, O>
where
    V: VersionControl,
    S: WorkItemStore,
    G: GitRemote,
    O: UrlOpener,
{
    /// Creates an engine.
    #[must_use]
    pub const fn new(
        vcs: Arc<V>,
        store: Arc<S>,
        git: Arc<G>,
        opener: Arc<O>,
        context: WorkflowContext,
        refresh: RefreshSignal,
    ) -> Self {
        Self {
            vcs,
            store,
            git,
            opener,
            context,
            refresh,
        }
    }

    /// Returns the context sequences run in.
    #[must_use]
    pub const fn context(&self) -> &WorkflowContext {
        &self.context
    }

    /// Returns the refresh signal triggered on success.
    #[must_use]
    pub const fn refresh_signal(&self) -> &RefreshSignal {
        &self.refresh
    }

    /// Starts work on an item.
    ///
    /// Fetches, checks out `branch`, pulls, rebases onto the remote
    /// integration branch, then assigns the item to the current user and
    /// moves it to the in-progress state.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StepFailed`] at the first failing step.
    pub async fn start_work(
        &self,
        item: WorkItemId,
        branch: &BranchName,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut driver = SequenceDriver::new(LifecycleSequence::StartWork);
        driver.step(WorkflowStage::Fetched, self.vcs.fetch()).await?;
        driver
            .step(WorkflowStage::CheckedOut, self.vcs.checkout(branch))
            .await?;
        driver.step(WorkflowStage::Synced, self.vcs.pull()).await?;
        let onto = self.integration_upstream();
        driver
            .step(WorkflowStage::Rebased, self.vcs.rebase(&onto))
            .await?;

        let patch = JsonPatch::new()
            .with(PatchOperation::replace_field(
                WorkItemField::AssignedTo,
                self.context.current_user.as_str(),
            ))
            .with(PatchOperation::replace_field(
                WorkItemField::State,
                self.context.in_progress_state.as_str(),
            ));
        driver
            .step(
                WorkflowStage::ItemActivated,
                self.store.update_work_item(&self.context.scope, item, &patch),
            )
            .await?;

        Ok(self.complete(driver))
    }

    /// Finishes work on an item.
    ///
    /// Fetches, checks out and pushes `branch`, switches to the integration
    /// branch, deletes the local branch, opens the pull request page and
    /// moves the item to the resolved state. A failure to open the page is
    /// logged and does not stop the sequence.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StepFailed`] at the first failing step.
    pub async fn finish_work(
        &self,
        item: WorkItemId,
        branch: &BranchName,
    ) -> Result<WorkflowReport, WorkflowError> {
        let mut driver = SequenceDriver::new(LifecycleSequence::FinishWork);
        driver.step(WorkflowStage::Fetched, self.vcs.fetch()).await?;
        driver
            .step(WorkflowStage::CheckedOut, self.vcs.checkout(branch))
            .await?;
        driver.step(WorkflowStage::Pushed, self.vcs.push()).await?;
        driver
            .step(
                WorkflowStage::SwitchedToIntegration,
                self.vcs.checkout(&self.context.integration_branch),
            )
            .await?;
        driver
            .step(WorkflowStage::BranchDeleted, self.vcs.delete_branch(branch))
            .await?;

        let url = self.pull_request_url(branch);
        if let Err(err) = self.opener.open(&url).await {
            tracing::warn!(%url, error = %err, "could not open pull request page");
        }
        driver.mark(WorkflowStage::PullRequestOpened);

        let patch = JsonPatch::new().with(PatchOperation::replace_field(
            WorkItemField::State,
            self.context.resolved_state.as_str(),
        ));
        driver
            .step(
                WorkflowStage::ItemResolved,
                self.store.update_work_item(&self.context.scope, item, &patch),
            )
            .await?;

        Ok(self.complete(driver))
    }

    /// Checks out an item's linked branch.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StepFailed`] when the checkout fails.
    pub async fn checkout(&self, branch: &BranchName) -> Result<WorkflowReport, WorkflowError> {
        let mut driver = SequenceDriver::new(LifecycleSequence::Checkout);
        driver
            .step(WorkflowStage::CheckedOut, self.vcs.checkout(branch))
            .await?;
        Ok(self.complete(driver))
    }

    /// Creates a remote branch for an item and links it.
    ///
    /// The proposed name is offered to `prompt`, which may edit it. The
    /// branch is created at the integration branch head and must not exist
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Cancelled`] when the prompt is dismissed or
    /// left empty, [`WorkflowError::InvalidInput`] when the confirmed name
    /// is not a valid branch name, and [`WorkflowError::StepFailed`] when a
    /// remote step fails or the ref update is rejected.
    pub async fn create_branch<P>(
        &self,
        item: WorkItemId,
        title: &str,
        prompt: &P,
    ) -> Result<CreatedBranch, WorkflowError>
    where
        P: BranchNamePrompt + ?Sized,
    {
        let proposed = propose_branch_name(&self.context.branch_prefix, item, title);
        let confirmed = prompt
            .confirm_branch_name(&proposed)
            .await
            .filter(|name| !name.trim().is_empty())
            .ok_or(WorkflowError::Cancelled)?;
        let branch = BranchName::new(confirmed)?;

        let scope = &self.context.scope;
        let repository = &self.context.repository;
        let mut driver = SequenceDriver::new(LifecycleSequence::CreateBranch);

        let head = driver
            .step(WorkflowStage::HeadResolved, async {
                let stats = self
                    .git
                    .get_branch(scope, repository, &self.context.integration_branch)
                    .await?;
                stats.commit_id.ok_or_else(|| {
                    RemoteServiceError::Malformed(format!(
                        "branch {} has no head commit",
                        self.context.integration_branch
                    ))
                })
            })
            .await?;

        let update = RefUpdate::create_branch(&branch, head);
        driver
            .step(WorkflowStage::RefCreated, async {
                let outcome = self.git.update_ref(scope, repository, &update).await?;
                if outcome.success {
                    Ok(())
                } else {
                    Err(StepFailure::RefRejected {
                        name: outcome.name,
                        status: outcome.status,
                    })
                }
            })
            .await?;

        let relation = WorkItemRelation::branch_link(BranchLink::encode(
            scope.project_id(),
            repository,
            &branch,
        ));
        driver
            .step(WorkflowStage::BranchLinked, async {
                let operation = PatchOperation::add_relation(&relation)
                    .map_err(|err| RemoteServiceError::Malformed(err.to_string()))?;
                let patch = JsonPatch::new().with(operation);
                self.store.update_work_item(scope, item, &patch).await
            })
            .await?;

        let report = self.complete(driver);
        Ok(CreatedBranch { branch, report })
    }

    /// Creates a work item with a title and optional Markdown description.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidInput`] for an empty type or title
    /// and [`WorkflowError::StepFailed`] when the remote call fails.
    pub async fn create_work_item(
        &self,
        work_item_type: &str,
        title: &str,
        description: Option<&str>,
    ) -> Result<CreatedWorkItem, WorkflowError> {
        if work_item_type.trim().is_empty() {
            return Err(WorkItemDomainError::EmptyWorkItemType.into());
        }
        if title.trim().is_empty() {
            return Err(WorkItemDomainError::EmptyTitle.into());
        }

        let mut patch =
            JsonPatch::new().with(PatchOperation::add_field(WorkItemField::Title, title));
        if let Some(markdown) = description {
            patch = patch.with(PatchOperation::add_field(
                WorkItemField::Description,
                render_rich_text(markdown),
            ));
        }

        let mut driver = SequenceDriver::new(LifecycleSequence::CreateWorkItem);
        let id = driver
            .step(
                WorkflowStage::ItemCreated,
                self.store
                    .create_work_item(&self.context.scope, work_item_type, &patch),
            )
            .await?;
        let report = self.complete(driver);
        Ok(CreatedWorkItem { id, report })
    }

    /// Replaces one field of an item.
    ///
    /// Rich-text fields are authored as Markdown and submitted as HTML.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::StepFailed`] when the remote call fails.
    pub async fn update_field(
        &self,
        item: WorkItemId,
        field: WorkItemField,
        value: &str,
    ) -> Result<WorkflowReport, WorkflowError> {
        let rendered = if field.is_rich_text() {
            render_rich_text(value)
        } else {
            value.to_owned()
        };
        let patch = JsonPatch::new().with(PatchOperation::replace_field(field, rendered));

        let mut driver = SequenceDriver::new(LifecycleSequence::UpdateField);
        driver
            .step(
                WorkflowStage::FieldUpdated,
                self.store.update_work_item(&self.context.scope, item, &patch),
            )
            .await?;
        Ok(self.complete(driver))
    }

    /// Returns the text to append to a commit message to resolve `item`.
    ///
    /// # Errors
    ///
    /// Returns [`VersionControlError`] when the remote URL cannot be read.
    pub async fn commit_mention(
        &self,
        existing_message: &str,
        item: WorkItemId,
    ) -> Result<String, VersionControlError> {
        let remote_url = self.vcs.remote_url(&self.context.remote).await?;
        Ok(commit_mention(existing_message, item, remote_url.as_deref()))
    }

    /// Returns the pull request creation page for `branch`.
    #[must_use]
    pub fn pull_request_url(&self, branch: &BranchName) -> String {
        let scope = &self.context.scope;
        format!(
            "{}/{}/_git/{}/pullrequestcreate?sourceRef={}",
            scope.organization_url(),
            utf8_percent_encode(scope.project_name(), URI_COMPONENT),
            utf8_percent_encode(self.context.repository.as_str(), URI_COMPONENT),
            utf8_percent_encode(branch.as_str(), URI_COMPONENT),
        )
    }

    fn integration_upstream(&self) -> String {
        format!(
            "{}/{}",
            self.context.remote, self.context.integration_branch
        )
    }

    fn complete(&self, driver: SequenceDriver) -> WorkflowReport {
        let report = driver.finish();
        self.refresh.trigger();
        report
    }
}
