//! Unit tests for the work item board.

mod support;
mod tree_tests;
