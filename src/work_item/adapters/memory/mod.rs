//! In-memory adapters for tests and deterministic local runs.

mod git_remote;
mod interaction;
mod store;
mod version_control;

pub use git_remote::InMemoryGitRemote;
pub use interaction::{RecordingUrlOpener, ScriptedBranchNamePrompt};
pub use store::{InMemoryWorkItemStore, RecordedUpdate, StoreCalls};
pub use version_control::{RecordingVersionControl, VcsCall};
