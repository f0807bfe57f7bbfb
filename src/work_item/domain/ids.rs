//! Identifier and validated scalar types for the work item domain.

use super::WorkItemDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a remote work item.
///
/// # Examples
///
///     use boardsync::work_item::domain::WorkItemId;
///
///     let id = WorkItemId::new(42).expect("valid");
///     assert_eq!(id.value(), 42);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct WorkItemId(u32);

impl WorkItemId {
    /// Creates a validated work item identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemDomainError::InvalidWorkItemId`] when the value is
    /// zero.
    pub const fn new(value: u32) -> Result<Self, WorkItemDomainError> {
        if value == 0 {
            return Err(WorkItemDomainError::InvalidWorkItemId(0));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for WorkItemId {
    type Error = WorkItemDomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let narrowed =
            u32::try_from(value).map_err(|_| WorkItemDomainError::InvalidWorkItemId(value))?;
        Self::new(narrowed).map_err(|_| WorkItemDomainError::InvalidWorkItemId(value))
    }
}

impl From<WorkItemId> for i64 {
    fn from(value: WorkItemId) -> Self {
        Self::from(value.0)
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a saved query in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueryId(String);

impl QueryId {
    /// Creates a validated query identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemDomainError::EmptyQueryId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkItemDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(WorkItemDomainError::EmptyQueryId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QueryId {
    type Error = WorkItemDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QueryId> for String {
    fn from(value: QueryId) -> Self {
        value.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a remote project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a project identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Repository identifier, either the remote GUID or the repository name.
///
/// Both forms are accepted by the remote git API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryId(String);

impl RepositoryId {
    /// Creates a validated repository identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemDomainError::EmptyRepositoryId`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkItemDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(WorkItemDomainError::EmptyRepositoryId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RepositoryId {
    type Error = WorkItemDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RepositoryId> for String {
    fn from(value: RepositoryId) -> Self {
        value.0
    }
}

impl AsRef<str> for RepositoryId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
