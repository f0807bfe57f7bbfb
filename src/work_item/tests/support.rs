//! Shared builders for work item unit tests.

use crate::work_item::domain::{
    BranchLink, BranchName, BranchStats, IdentityRef, ProjectId, ProjectScope, RemoteWorkItem,
    RepositoryId, WorkItem, WorkItemFields, WorkItemId, WorkItemRelation, WorkflowContext,
};
use uuid::Uuid;

pub(super) const PROJECT_UUID: Uuid = Uuid::from_u128(0x6ce9_54b1_ce1f_45d1_b94d_e6bf_2464_ba2c);
pub(super) const REPOSITORY: &str = "fabrikam-web";
pub(super) const HEAD_COMMIT: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

pub(super) fn id(value: u32) -> WorkItemId {
    WorkItemId::new(value).expect("non-zero work item id")
}

pub(super) fn repository() -> RepositoryId {
    RepositoryId::new(REPOSITORY).expect("valid repository")
}

pub(super) fn branch(name: &str) -> BranchName {
    BranchName::new(name).expect("valid branch name")
}

pub(super) fn scope() -> ProjectScope {
    ProjectScope::new(
        "https://dev.azure.com/contoso/",
        ProjectId::from_uuid(PROJECT_UUID),
        "Fabrikam Fiber",
    )
}

pub(super) fn workflow_context() -> WorkflowContext {
    WorkflowContext {
        scope: scope(),
        repository: repository(),
        current_user: "ada@contoso.com".to_owned(),
        branch_prefix: "users/ada/".to_owned(),
        integration_branch: branch("master"),
        remote: "origin".to_owned(),
        in_progress_state: "Active".to_owned(),
        resolved_state: "Resolved".to_owned(),
    }
}

pub(super) fn remote_item(value: u32, title: &str, parent: Option<u32>) -> RemoteWorkItem {
    RemoteWorkItem {
        id: id(value),
        fields: WorkItemFields {
            id: Some(id(value)),
            work_item_type: "Task".to_owned(),
            title: title.to_owned(),
            state: "New".to_owned(),
            parent: parent.map(id),
            ..WorkItemFields::default()
        },
        relations: Vec::new(),
        web_url: None,
    }
}

pub(super) fn assigned_to(
    mut item: RemoteWorkItem,
    unique_name: &str,
    image_url: Option<&str>,
) -> RemoteWorkItem {
    item.fields.assigned_to = Some(IdentityRef {
        display_name: format!("{unique_name} (display)"),
        unique_name: unique_name.to_owned(),
        image_url: image_url.map(str::to_owned),
    });
    item
}

pub(super) fn with_raw_branch_link(mut item: RemoteWorkItem, url: &str) -> RemoteWorkItem {
    item.relations.push(WorkItemRelation::branch_link(url));
    item
}

pub(super) fn with_branch(item: RemoteWorkItem, name: &str) -> RemoteWorkItem {
    let url = BranchLink::encode(ProjectId::from_uuid(PROJECT_UUID), &repository(), &branch(name));
    with_raw_branch_link(item, &url)
}

pub(super) fn stats(name: &str, ahead: u32, behind: u32) -> BranchStats {
    BranchStats {
        name: name.to_owned(),
        ahead_count: ahead,
        behind_count: behind,
        commit_id: Some(HEAD_COMMIT.to_owned()),
    }
}

pub(super) fn work_item(value: u32, title: &str, parent: Option<u32>) -> WorkItem {
    WorkItem::from_remote(remote_item(value, title, parent), None, None)
}
