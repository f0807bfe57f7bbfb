//! Domain model for the work item board.
//!
//! Work items, their linked branches and the saved queries that select them
//! are plain value snapshots here; fetching, caching and mutation live in
//! the service and adapter layers.

mod branch;
mod context;
mod error;
mod fields;
mod ids;
mod mention;
mod patch;
mod query;
mod work_item;

pub use branch::{
    BranchLink, BranchName, BranchRef, BranchStats, GIT_REF_LINK_PREFIX, URI_COMPONENT,
    propose_branch_name,
};
pub use context::{MissingContext, ProjectScope, WorkflowContext};
pub use error::{BranchLinkError, WorkItemDomainError};
pub use fields::{IdentityRef, UnknownWorkItemField, WorkItemField, WorkItemFields};
pub use ids::{ProjectId, QueryId, RepositoryId, WorkItemId};
pub use mention::{commit_mention, is_github_remote, mention_text};
pub use patch::{JsonPatch, PatchOp, PatchOperation, RELATIONS_APPEND_PATH, render_rich_text};
pub use query::{Query, QueryResult, WorkItemLinkEdge, WorkItemReference};
pub use work_item::{
    ARTIFACT_LINK_RELATION, Assignee, AvatarBlob, BRANCH_RELATION_NAME, RelationAttributes,
    RemoteWorkItem, WorkItem, WorkItemRelation,
};
