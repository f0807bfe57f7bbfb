//! Lifecycle sequences invalidating the board tree.

use super::helpers::{Board, board, expand_first_query, id};
use boardsync::work_item::{
    adapters::memory::{ScriptedBranchNamePrompt, VcsCall},
    domain::{BranchName, QueryId, WorkItemField},
    services::TreeNode,
};
use rstest::rstest;

fn first_title(nodes: &[TreeNode]) -> Option<String> {
    nodes
        .first()
        .and_then(TreeNode::work_item)
        .map(|item| item.title().to_owned())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn successful_sequence_reloads_the_tree(board: Board) {
    let before = expand_first_query(&board).await;
    assert_eq!(first_title(&before).as_deref(), Some("Login"));

    board
        .engine
        .update_field(id(1), WorkItemField::Title, "Sign in")
        .await
        .expect("title updated");

    let my_work = QueryId::new("my-work").expect("valid query id");
    assert!(board.tree.cached_forest(&my_work).expect("cache").is_none());
    let after = expand_first_query(&board).await;
    assert_eq!(first_title(&after).as_deref(), Some("Sign in"));
    assert_eq!(board.store.calls().expect("calls").run_query, 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_sequence_keeps_the_cached_tree(board: Board) {
    expand_first_query(&board).await;
    let feature = BranchName::new("users/ada/2-login-form").expect("valid branch");
    board
        .vcs
        .fail_on(VcsCall::Pull, "fatal: couldn't find remote ref")
        .expect("register failure");

    let err = board
        .engine
        .start_work(id(2), &feature)
        .await
        .expect_err("pull fails");

    assert_eq!(err.completed_stages().len(), 2);
    let my_work = QueryId::new("my-work").expect("valid query id");
    assert!(board.tree.cached_forest(&my_work).expect("cache").is_some());
    let stored = board
        .store
        .item(id(2))
        .expect("store readable")
        .expect("item exists");
    assert_eq!(stored.fields.state, "New");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_branch_is_shown_after_reload(board: Board) {
    expand_first_query(&board).await;

    let created = board
        .engine
        .create_branch(id(3), "Validate password", &ScriptedBranchNamePrompt::accepting())
        .await
        .expect("branch created");
    assert_eq!(created.branch.as_str(), "users/ada/3-validate-password");
    assert_eq!(board.git.ref_updates().expect("ref updates").len(), 1);

    let roots = expand_first_query(&board).await;
    let epic = roots.first().expect("epic");
    let stories = board.tree.children(epic).await.expect("stories");
    let tasks = board
        .tree
        .children(stories.first().expect("story"))
        .await
        .expect("tasks");
    let task = tasks
        .first()
        .and_then(TreeNode::work_item)
        .expect("task item");
    assert_eq!(
        task.branch().map(|branch| branch.name().as_str()),
        Some("users/ada/3-validate-password")
    );
}
