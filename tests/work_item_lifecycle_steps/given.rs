//! Given steps for work item lifecycle BDD scenarios.

use super::world::LifecycleWorld;
use boardsync::work_item::{
    adapters::memory::VcsCall,
    domain::{
        BranchLink, BranchName, BranchStats, RemoteWorkItem, WorkItemFields, WorkItemId,
        WorkItemRelation,
    },
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

fn remote_item(id: u32, title: &str) -> eyre::Result<RemoteWorkItem> {
    let item_id = WorkItemId::new(id)?;
    Ok(RemoteWorkItem {
        id: item_id,
        fields: WorkItemFields {
            id: Some(item_id),
            work_item_type: "User Story".to_owned(),
            title: title.to_owned(),
            state: "New".to_owned(),
            ..WorkItemFields::default()
        },
        relations: Vec::new(),
        web_url: None,
    })
}

fn branch_stats(name: &str) -> BranchStats {
    BranchStats {
        name: name.to_owned(),
        ahead_count: 1,
        behind_count: 0,
        commit_id: Some("a94a8fe5ccb19ba61c4c0873d391e987982fbbd3".to_owned()),
    }
}

#[given(r#"work item {id:u32} titled "{title}" with linked branch "{branch}""#)]
fn linked_work_item(
    world: &mut LifecycleWorld,
    id: u32,
    title: String,
    branch: String,
) -> Result<(), eyre::Report> {
    let context = world.engine.context();
    let name = BranchName::new(branch.as_str())?;
    let link = BranchLink::encode(context.scope.project_id(), &context.repository, &name);
    let mut item = remote_item(id, &title)?;
    item.relations.push(WorkItemRelation::branch_link(link));

    world
        .git
        .insert_branch(context.repository.clone(), branch_stats(&branch))
        .wrap_err("register linked branch")?;
    world
        .git
        .insert_branch(
            context.repository.clone(),
            branch_stats(context.integration_branch.as_str()),
        )
        .wrap_err("register integration branch")?;
    world.store.insert_item(item).wrap_err("store work item")?;
    Ok(())
}

#[given(r#"an unlinked work item {id:u32} titled "{title}""#)]
fn unlinked_work_item(
    world: &mut LifecycleWorld,
    id: u32,
    title: String,
) -> Result<(), eyre::Report> {
    let context = world.engine.context();
    world
        .git
        .insert_branch(
            context.repository.clone(),
            branch_stats(context.integration_branch.as_str()),
        )
        .wrap_err("register integration branch")?;
    world
        .store
        .insert_item(remote_item(id, &title)?)
        .wrap_err("store work item")?;
    Ok(())
}

#[given(r#"checking out "{branch}" fails with "{detail}""#)]
fn checkout_fails(
    world: &mut LifecycleWorld,
    branch: String,
    detail: String,
) -> Result<(), eyre::Report> {
    world
        .vcs
        .fail_on(VcsCall::Checkout(branch), detail)
        .wrap_err("register checkout failure")?;
    Ok(())
}
