//! Application services for the work item board.
//!
//! The read path runs query executor, hydrator and tree assembler in that
//! order. The workflow engine mutates git and the board independently and
//! invalidates the read path through the shared refresh signal.

mod hydrator;
mod preview;
mod query;
mod refresh;
mod sequence;
mod tree;
mod workflow;

pub use hydrator::{DeletedBranch, HydratedItems, ItemHydrator, UndecodableLink};
pub use preview::{PreviewAction, PreviewOutcome, PreviewSession};
pub use query::{QueryExecutor, QueryOutcome};
pub use refresh::RefreshSignal;
pub use sequence::{
    LifecycleSequence, SequenceDriver, StepFailure, WorkflowReport, WorkflowStage,
};
pub use tree::{
    BoardTree, ForestLoader, ItemNode, LoadedQuery, QueryForest, ReadPipeline, TreeContext,
    TreeError, TreeNode,
};
pub use workflow::{CreatedBranch, CreatedWorkItem, WorkflowEngine, WorkflowError};
