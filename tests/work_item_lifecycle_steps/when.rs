//! When steps for work item lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use boardsync::work_item::{
    adapters::memory::ScriptedBranchNamePrompt, services::PreviewAction,
};
use rstest_bdd_macros::when;

fn dispatch(
    world: &mut LifecycleWorld,
    id: u32,
    action: PreviewAction,
    prompt: ScriptedBranchNamePrompt,
) -> Result<(), eyre::Report> {
    let item = world.hydrated(id)?;
    let session = world.open_session(item, prompt.clone());
    let result = run_async(session.dispatch(action));
    session.close();
    world.prompt = Some(prompt);
    world.last_result = Some(result);
    Ok(())
}

#[when("work is started on item {id:u32}")]
fn start_work(world: &mut LifecycleWorld, id: u32) -> Result<(), eyre::Report> {
    dispatch(
        world,
        id,
        PreviewAction::StartWork,
        ScriptedBranchNamePrompt::accepting(),
    )
}

#[when("work is finished on item {id:u32}")]
fn finish_work(world: &mut LifecycleWorld, id: u32) -> Result<(), eyre::Report> {
    dispatch(
        world,
        id,
        PreviewAction::FinishWork,
        ScriptedBranchNamePrompt::accepting(),
    )
}

#[when("a branch is created for item {id:u32} accepting the proposed name")]
fn create_branch_accepting(world: &mut LifecycleWorld, id: u32) -> Result<(), eyre::Report> {
    dispatch(
        world,
        id,
        PreviewAction::CreateBranch,
        ScriptedBranchNamePrompt::accepting(),
    )
}

#[when("a branch is created for item {id:u32} and the prompt is dismissed")]
fn create_branch_dismissed(world: &mut LifecycleWorld, id: u32) -> Result<(), eyre::Report> {
    dispatch(
        world,
        id,
        PreviewAction::CreateBranch,
        ScriptedBranchNamePrompt::cancelling(),
    )
}
