//! Error types for work item domain validation and link decoding.

use thiserror::Error;

/// Errors returned while constructing domain work item values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkItemDomainError {
    /// The work item identifier is not a positive integer.
    #[error("invalid work item id {0}, expected a positive integer")]
    InvalidWorkItemId(i64),

    /// The saved query identifier is empty after trimming.
    #[error("query identifier must not be empty")]
    EmptyQueryId,

    /// The repository identifier is empty after trimming.
    #[error("repository identifier must not be empty")]
    EmptyRepositoryId,

    /// The branch name violates ref-name constraints.
    #[error("invalid branch name '{0}'")]
    InvalidBranchName(String),

    /// The work item type is empty after trimming.
    #[error("work item type must not be empty")]
    EmptyWorkItemType,

    /// The work item title is empty after trimming.
    #[error("work item title must not be empty")]
    EmptyTitle,
}

/// Errors returned while decoding a branch artifact link.
///
/// The read path records these instead of raising them: an item whose link
/// cannot be decoded simply has no branch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BranchLinkError {
    /// The link is not valid percent-encoded UTF-8.
    #[error("branch link is not valid UTF-8 after decoding: {0}")]
    Encoding(String),

    /// The decoded link has no `/GB` branch marker.
    #[error("branch link has no GB marker: {0}")]
    MissingBranchMarker(String),

    /// The decoded link has no repository segment.
    #[error("branch link has no repository segment: {0}")]
    MissingRepository(String),

    /// The branch name after the marker is not a valid ref name.
    #[error("branch link carries an invalid branch name: {0}")]
    InvalidBranchName(String),
}
