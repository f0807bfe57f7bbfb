//! Then steps for work item lifecycle BDD scenarios.

use super::world::LifecycleWorld;
use boardsync::work_item::{
    adapters::memory::VcsCall,
    domain::{BranchLink, RemoteWorkItem, WorkItemId},
    services::{PreviewOutcome, WorkflowError},
};
use eyre::eyre;
use rstest_bdd_macros::then;

fn render_call(call: &VcsCall) -> String {
    match call {
        VcsCall::Fetch => "fetch".to_owned(),
        VcsCall::Checkout(branch) => format!("checkout {branch}"),
        VcsCall::Pull => "pull".to_owned(),
        VcsCall::Push => "push".to_owned(),
        VcsCall::DeleteBranch(branch) => format!("delete {branch}"),
        VcsCall::Rebase(onto) => format!("rebase {onto}"),
    }
}

fn stored(world: &LifecycleWorld, id: u32) -> eyre::Result<RemoteWorkItem> {
    world
        .store
        .item(WorkItemId::new(id)?)?
        .ok_or_else(|| eyre!("work item {id} missing from store"))
}

fn last_error(world: &LifecycleWorld) -> eyre::Result<&WorkflowError> {
    match world.last_result.as_ref() {
        Some(Err(err)) => Ok(err),
        Some(Ok(outcome)) => Err(eyre!("expected a failure, got {outcome:?}")),
        None => Err(eyre!("no action was dispatched")),
    }
}

#[then(r#"the git commands were "{commands}""#)]
fn git_commands_were(world: &LifecycleWorld, commands: String) -> Result<(), eyre::Report> {
    let rendered: Vec<String> = world.vcs.calls()?.iter().map(render_call).collect();
    let expected: Vec<&str> = commands.split(", ").collect();
    if rendered != expected {
        return Err(eyre!("expected git commands {expected:?}, found {rendered:?}"));
    }
    Ok(())
}

#[then("no git command was run")]
fn no_git_command(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let calls = world.vcs.calls()?;
    if !calls.is_empty() {
        return Err(eyre!("expected no git commands, found {calls:?}"));
    }
    Ok(())
}

#[then(r#"work item {id:u32} is in state "{state}""#)]
fn item_state_is(world: &LifecycleWorld, id: u32, state: String) -> Result<(), eyre::Report> {
    let item = stored(world, id)?;
    if item.fields.state != state {
        return Err(eyre!(
            "expected state {state}, found {}",
            item.fields.state
        ));
    }
    Ok(())
}

#[then(r#"work item {id:u32} is assigned to "{user}""#)]
fn item_assigned_to(world: &LifecycleWorld, id: u32, user: String) -> Result<(), eyre::Report> {
    let item = stored(world, id)?;
    let assignee = item
        .fields
        .assigned_to
        .map(|identity| identity.unique_name);
    if assignee.as_deref() != Some(user.as_str()) {
        return Err(eyre!("expected assignee {user}, found {assignee:?}"));
    }
    Ok(())
}

#[then(r#"work item {id:u32} links branch "{branch}""#)]
fn item_links_branch(world: &LifecycleWorld, id: u32, branch: String) -> Result<(), eyre::Report> {
    let item = stored(world, id)?;
    let relation = item
        .first_branch_relation()
        .ok_or_else(|| eyre!("work item {id} has no branch relation"))?;
    let link = BranchLink::decode(&relation.url)?;
    if link.branch_name().as_str() != branch {
        return Err(eyre!(
            "expected linked branch {branch}, found {}",
            link.branch_name()
        ));
    }
    Ok(())
}

#[then(r#"the opened page ends with "{suffix}""#)]
fn opened_page_ends_with(world: &LifecycleWorld, suffix: String) -> Result<(), eyre::Report> {
    let opened = world.opener.opened();
    match opened.as_slice() {
        [url] if url.ends_with(&suffix) => Ok(()),
        _ => Err(eyre!("expected one page ending with {suffix}, found {opened:?}")),
    }
}

#[then(r#"the sequence failed at stage "{stage}""#)]
fn sequence_failed_at(world: &LifecycleWorld, stage: String) -> Result<(), eyre::Report> {
    match last_error(world)? {
        WorkflowError::StepFailed { stage: failed, .. } if failed.to_string() == stage => Ok(()),
        other => Err(eyre!("expected failure at {stage}, got {other:?}")),
    }
}

#[then("the item has no linked branch")]
fn item_has_no_linked_branch(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    match last_error(world)? {
        WorkflowError::MissingBranch(_) => Ok(()),
        other => Err(eyre!("expected a missing branch error, got {other:?}")),
    }
}

#[then(r#"the proposed branch name was "{name}""#)]
fn proposed_branch_name_was(world: &LifecycleWorld, name: String) -> Result<(), eyre::Report> {
    let offered = world
        .prompt
        .as_ref()
        .map(|prompt| prompt.offered())
        .unwrap_or_default();
    if offered != [name.clone()] {
        return Err(eyre!("expected proposal {name}, found {offered:?}"));
    }
    match world.last_result.as_ref() {
        Some(Ok(PreviewOutcome::BranchCreated(created))) if created.branch.as_str() == name => {
            Ok(())
        }
        other => Err(eyre!("expected branch {name} to be created, got {other:?}")),
    }
}

#[then("branch creation was cancelled")]
fn branch_creation_cancelled(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    match last_error(world)? {
        WorkflowError::Cancelled => Ok(()),
        other => Err(eyre!("expected cancellation, got {other:?}")),
    }
}

#[then("no ref update was submitted")]
fn no_ref_update(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let updates = world.git.ref_updates()?;
    if !updates.is_empty() {
        return Err(eyre!("expected no ref updates, found {updates:?}"));
    }
    Ok(())
}

#[then("the board was refreshed")]
fn board_refreshed(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    if world.refresh.generation() == 0 {
        return Err(eyre!("expected the refresh signal to fire"));
    }
    Ok(())
}

#[then("the board was not refreshed")]
fn board_not_refreshed(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let generation = world.refresh.generation();
    if generation != 0 {
        return Err(eyre!("expected no refresh, generation is {generation}"));
    }
    Ok(())
}
