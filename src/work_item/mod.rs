//! Work item board: saved queries, item hierarchy and branch lifecycle.
//!
//! Saved queries are run against the remote board, their items hydrated
//! with avatars and linked branches, and assembled into a lazily expanded
//! tree. Lifecycle sequences interleave git operations with item state
//! changes and invalidate the tree when they complete. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Read path and workflow services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
