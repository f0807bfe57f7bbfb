//! Adapter implementations for the board ports.

pub mod azure;
pub mod git_cli;
pub mod memory;

mod system_opener;

pub use system_opener::SystemUrlOpener;
