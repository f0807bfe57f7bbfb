//! Shared board wiring for in-memory integration tests.

use boardsync::{
    settings::Settings,
    work_item::{
        adapters::memory::{
            InMemoryGitRemote, InMemoryWorkItemStore, RecordingUrlOpener, RecordingVersionControl,
        },
        domain::{
            AvatarBlob, BranchLink, BranchName, BranchStats, IdentityRef, QueryId, QueryResult,
            RemoteWorkItem, WorkItemFields, WorkItemId, WorkItemRelation, WorkflowContext,
        },
        services::{
            BoardTree, ItemHydrator, QueryExecutor, ReadPipeline, RefreshSignal, TreeNode,
            WorkflowEngine,
        },
    },
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;

pub const AVATAR_URL: &str = "https://dev.azure.com/contoso/_apis/GraphProfile/avatar/ada";

const SETTINGS: &str = r#"{
    "organization_url": "https://dev.azure.com/contoso/",
    "project_id": "6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
    "project_name": "Fabrikam",
    "repository": "fabrikam-web",
    "user": "ada@contoso.com",
    "branch_prefix": "users/ada/",
    "queries": [
        { "id": "my-work", "name": "My work" },
        { "id": "empty", "name": "Nothing here" }
    ],
    "personal_access_token": "pat"
}"#;

pub type Pipeline = ReadPipeline<InMemoryWorkItemStore, InMemoryGitRemote, DefaultClock>;

pub type Engine = WorkflowEngine<
    RecordingVersionControl,
    InMemoryWorkItemStore,
    InMemoryGitRemote,
    RecordingUrlOpener,
>;

/// Every board component wired over shared in-memory adapters.
pub struct Board {
    pub store: Arc<InMemoryWorkItemStore>,
    pub git: Arc<InMemoryGitRemote>,
    pub vcs: Arc<RecordingVersionControl>,
    pub tree: BoardTree<Pipeline>,
    pub engine: Engine,
}

pub fn id(value: u32) -> WorkItemId {
    WorkItemId::new(value).expect("non-zero work item id")
}

fn item(value: u32, title: &str, parent: Option<u32>) -> RemoteWorkItem {
    RemoteWorkItem {
        id: id(value),
        fields: WorkItemFields {
            id: Some(id(value)),
            work_item_type: "User Story".to_owned(),
            title: title.to_owned(),
            state: "New".to_owned(),
            parent: parent.map(id),
            ..WorkItemFields::default()
        },
        relations: Vec::new(),
        web_url: Some(format!(
            "https://dev.azure.com/contoso/Fabrikam/_workitems/edit/{value}"
        )),
    }
}

fn seed(workflow: &WorkflowContext, store: &InMemoryWorkItemStore, git: &InMemoryGitRemote) {
    let feature = BranchName::new("users/ada/2-login-form").expect("valid branch");
    let link = BranchLink::encode(workflow.scope.project_id(), &workflow.repository, &feature);

    let mut epic = item(1, "Login", None);
    epic.fields.assigned_to = Some(IdentityRef {
        display_name: "Ada Lovelace".to_owned(),
        unique_name: "ada@contoso.com".to_owned(),
        image_url: Some(AVATAR_URL.to_owned()),
    });
    let mut story = item(2, "Login form", Some(1));
    story.relations.push(WorkItemRelation::branch_link(link));
    let task = item(3, "Validate password", Some(2));

    for remote in [epic, story, task] {
        store.insert_item(remote).expect("insert item");
    }
    store
        .set_avatar(AVATAR_URL, AvatarBlob::from_bytes("image/png", b"avatar"))
        .expect("set avatar");
    store
        .set_query(
            QueryId::new("my-work").expect("valid query id"),
            QueryResult::hierarchical([
                (None, id(1)),
                (Some(id(1)), id(2)),
                (Some(id(2)), id(3)),
            ]),
        )
        .expect("register query");
    store
        .set_query(
            QueryId::new("empty").expect("valid query id"),
            QueryResult::flat(Vec::<WorkItemId>::new()),
        )
        .expect("register query");

    for (name, ahead) in [(feature.as_str(), 2), ("master", 0)] {
        git.insert_branch(
            workflow.repository.clone(),
            BranchStats {
                name: name.to_owned(),
                ahead_count: ahead,
                behind_count: 1,
                commit_id: Some("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3".to_owned()),
            },
        )
        .expect("insert branch");
    }
}

#[fixture]
pub fn board() -> Board {
    let settings = Settings::from_json(SETTINGS).expect("settings parse");
    let workflow = settings.workflow_context().expect("complete settings");
    let tree_context = settings.tree_context(true).expect("valid queries");

    let store = Arc::new(InMemoryWorkItemStore::new());
    let git = Arc::new(InMemoryGitRemote::new());
    let vcs = Arc::new(RecordingVersionControl::new());
    seed(&workflow, &store, &git);

    let refresh = RefreshSignal::new();
    let pipeline = Arc::new(ReadPipeline::new(
        QueryExecutor::new(Arc::clone(&store), settings.project_scope()),
        ItemHydrator::new(Arc::clone(&store), Arc::clone(&git), Arc::new(DefaultClock)),
    ));
    let tree = BoardTree::new(pipeline, tree_context, refresh.clone());
    let engine = WorkflowEngine::new(
        Arc::clone(&vcs),
        Arc::clone(&store),
        Arc::clone(&git),
        Arc::new(RecordingUrlOpener::new()),
        workflow,
        refresh,
    );

    Board {
        store,
        git,
        vcs,
        tree,
        engine,
    }
}

/// Expands the first query node and returns its root items.
pub async fn expand_first_query(board: &Board) -> Vec<TreeNode> {
    let query = board.tree.roots().into_iter().next().expect("a query node");
    board.tree.children(&query).await.expect("query loads")
}
