//! Port contracts for the work item board.
//!
//! Ports define infrastructure-agnostic interfaces used by the read path and
//! the workflow engine.

pub mod interaction;
pub mod remote;
pub mod version_control;

pub use interaction::{BranchNamePrompt, OpenerError, UrlOpener};
pub use remote::{
    GitRemote, RefUpdate, RefUpdateOutcome, RemoteResult, RemoteServiceError, WorkItemStore,
    ZERO_OBJECT_ID,
};
pub use version_control::{VersionControl, VersionControlError, VersionControlResult};
