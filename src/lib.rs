//! Boardsync: Azure Boards work items alongside a local git checkout.
//!
//! This crate runs saved work item queries, assembles the returned items
//! into a parent/child tree with their assignees and linked branches, and
//! drives the "start work" and "finish work" lifecycles that interleave git
//! operations with work item state changes.
//!
//! # Architecture
//!
//! Boardsync follows hexagonal architecture principles:
//!
//! - **Domain**: Work item snapshots, branch links and patches with no
//!   infrastructure dependencies
//! - **Ports**: Trait interfaces for the remote board, hosted git, the local
//!   working tree and the interactive host
//! - **Adapters**: Azure DevOps REST, the `git` CLI and in-memory doubles
//!
//! # Modules
//!
//! - [`settings`]: Board configuration and environment overrides
//! - [`work_item`]: Query read path, tree assembly and lifecycle workflows

pub mod settings;
pub mod work_item;
