//! Settings through query execution, hydration and tree expansion.

use super::helpers::{Board, board, expand_first_query, id};
use boardsync::work_item::{
    domain::{BranchLink, BranchName, WorkItemRelation},
    services::TreeNode,
};
use rstest::rstest;

#[rstest]
fn configured_queries_become_top_level_nodes(board: Board) {
    let labels: Vec<String> = board.tree.roots().iter().map(TreeNode::label).collect();
    assert_eq!(labels, vec!["My work", "Nothing here"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expanding_a_query_hydrates_the_hierarchy(board: Board) {
    let roots = expand_first_query(&board).await;

    let [TreeNode::Item(epic)] = roots.as_slice() else {
        panic!("expected one root item, got {roots:?}");
    };
    assert_eq!(epic.item().title(), "Login");
    let avatar = epic
        .item()
        .assignee()
        .and_then(|who| who.avatar())
        .expect("avatar resolved");
    assert_eq!(avatar.to_data_uri(), "data:image/png;base64,YXZhdGFy");
    assert!(epic.item().branch().is_none());

    let stories = board
        .tree
        .children(&TreeNode::Item(epic.clone()))
        .await
        .expect("stories");
    let story = stories
        .first()
        .and_then(TreeNode::work_item)
        .expect("story item");
    let branch = story.branch().expect("story branch resolved");
    assert_eq!(branch.name().as_str(), "users/ada/2-login-form");
    assert_eq!(branch.ahead_count(), 2);
    assert_eq!(branch.behind_count(), 1);
    assert_eq!(story.parent(), Some(id(1)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_query_has_no_children(board: Board) {
    let query = board.tree.roots().into_iter().nth(1).expect("second query");
    let children = board.tree.children(&query).await.expect("query loads");
    assert!(children.is_empty());
    assert_eq!(board.store.calls().expect("calls").get_work_items, 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_expansion_reuses_the_forest(board: Board) {
    expand_first_query(&board).await;
    expand_first_query(&board).await;

    let calls = board.store.calls().expect("calls");
    assert_eq!(calls.run_query, 1);
    assert_eq!(calls.get_work_items, 1);
    assert_eq!(calls.get_avatar, 1);
    assert_eq!(board.git.branch_lookups().expect("lookups"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleted_remote_branch_does_not_hide_the_query(board: Board) {
    let workflow = board.engine.context();
    let merged = BranchName::new("users/ada/3-validate-password").expect("valid branch");
    let mut task = board
        .store
        .item(id(3))
        .expect("store readable")
        .expect("task seeded");
    task.relations.push(WorkItemRelation::branch_link(BranchLink::encode(
        workflow.scope.project_id(),
        &workflow.repository,
        &merged,
    )));
    board.store.insert_item(task).expect("replace task");

    let roots = expand_first_query(&board).await;
    let epic = roots.first().expect("epic node");
    let stories = board.tree.children(epic).await.expect("stories");
    let story = stories.first().expect("story node");
    let tasks = board.tree.children(story).await.expect("tasks");

    let task = tasks.first().and_then(TreeNode::work_item).expect("task item");
    assert_eq!(task.title(), "Validate password");
    assert!(task.branch().is_none());
    let story_item = story.work_item().expect("story item");
    assert!(story_item.branch().is_some());
}
