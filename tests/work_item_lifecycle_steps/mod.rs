//! Step definitions for work item lifecycle scenarios.

mod given;
mod then;
mod when;
pub mod world;
