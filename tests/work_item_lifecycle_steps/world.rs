//! Shared world state for work item lifecycle BDD scenarios.

use std::sync::Arc;

use boardsync::{
    settings::Settings,
    work_item::{
        adapters::memory::{
            InMemoryGitRemote, InMemoryWorkItemStore, RecordingUrlOpener, RecordingVersionControl,
            ScriptedBranchNamePrompt,
        },
        domain::{ProjectScope, WorkItem, WorkItemId},
        services::{
            ItemHydrator, PreviewOutcome, PreviewSession, RefreshSignal, WorkflowEngine,
            WorkflowError,
        },
    },
};
use eyre::{WrapErr, eyre};
use mockable::DefaultClock;
use rstest::fixture;

const SETTINGS: &str = r#"{
    "organization_url": "https://dev.azure.com/contoso",
    "project_id": "6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
    "project_name": "Fabrikam",
    "repository": "fabrikam-web",
    "user": "ada@contoso.com",
    "branch_prefix": "users/ada/",
    "personal_access_token": "pat"
}"#;

/// Engine type used by the BDD world.
pub type TestEngine = WorkflowEngine<
    RecordingVersionControl,
    InMemoryWorkItemStore,
    InMemoryGitRemote,
    RecordingUrlOpener,
>;

/// Session type used by the BDD world.
pub type TestSession = PreviewSession<
    RecordingVersionControl,
    InMemoryWorkItemStore,
    InMemoryGitRemote,
    RecordingUrlOpener,
>;

/// Scenario world for lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub vcs: Arc<RecordingVersionControl>,
    pub store: Arc<InMemoryWorkItemStore>,
    pub git: Arc<InMemoryGitRemote>,
    pub opener: Arc<RecordingUrlOpener>,
    pub refresh: RefreshSignal,
    pub scope: ProjectScope,
    pub engine: Arc<TestEngine>,
    pub hydrator: ItemHydrator<InMemoryWorkItemStore, InMemoryGitRemote, DefaultClock>,
    pub prompt: Option<ScriptedBranchNamePrompt>,
    pub last_result: Option<Result<PreviewOutcome, WorkflowError>>,
}

impl LifecycleWorld {
    /// Creates a world over fresh in-memory adapters.
    ///
    /// # Errors
    ///
    /// Returns an error when the embedded settings are invalid.
    pub fn new() -> eyre::Result<Self> {
        let workflow = Settings::from_json(SETTINGS)
            .and_then(|settings| settings.workflow_context())
            .wrap_err("build workflow context")?;
        let vcs = Arc::new(RecordingVersionControl::new());
        let store = Arc::new(InMemoryWorkItemStore::new());
        let git = Arc::new(InMemoryGitRemote::new());
        let opener = Arc::new(RecordingUrlOpener::new());
        let refresh = RefreshSignal::new();
        let scope = workflow.scope.clone();

        let engine = Arc::new(WorkflowEngine::new(
            Arc::clone(&vcs),
            Arc::clone(&store),
            Arc::clone(&git),
            Arc::clone(&opener),
            workflow,
            refresh.clone(),
        ));
        let hydrator = ItemHydrator::new(
            Arc::clone(&store),
            Arc::clone(&git),
            Arc::new(DefaultClock),
        );

        Ok(Self {
            vcs,
            store,
            git,
            opener,
            refresh,
            scope,
            engine,
            hydrator,
            prompt: None,
            last_result: None,
        })
    }

    /// Hydrates one item the way the board tree would.
    ///
    /// # Errors
    ///
    /// Returns an error when the item cannot be loaded.
    pub fn hydrated(&self, id: u32) -> eyre::Result<WorkItem> {
        let item_id = WorkItemId::new(id)?;
        let hydrated = run_async(self.hydrator.hydrate(&self.scope, &[item_id]))
            .wrap_err("hydrate work item")?;
        hydrated
            .items
            .into_iter()
            .next()
            .ok_or_else(|| eyre!("work item {id} not found"))
    }

    /// Opens the detail surface on `item` with the given prompt.
    #[must_use]
    pub fn open_session(&self, item: WorkItem, prompt: ScriptedBranchNamePrompt) -> TestSession {
        PreviewSession::open(Arc::clone(&self.engine), Arc::new(prompt), item)
    }
}

/// Fixture that creates a new scenario world.
///
/// # Panics
///
/// Panics when the embedded settings are invalid.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::new().expect("scenario world builds")
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
