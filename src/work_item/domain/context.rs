//! Board context values: which organization, project, repository and user
//! the crate acts for.

use super::{ProjectId, RepositoryId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Part of the board context that is not configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContext {
    /// No organization is selected.
    Organization,
    /// No project is selected.
    Project,
    /// No repository is selected.
    Repository,
    /// No current user is known.
    User,
}

impl fmt::Display for MissingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Organization => "organization",
            Self::Project => "project",
            Self::Repository => "repository",
            Self::User => "user",
        };
        f.write_str(label)
    }
}

/// Organization and project every remote call is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectScope {
    organization_url: String,
    project_id: ProjectId,
    project_name: String,
}

impl ProjectScope {
    /// Creates a scope; a trailing slash on the organization URL is dropped.
    #[must_use]
    pub fn new(
        organization_url: impl Into<String>,
        project_id: ProjectId,
        project_name: impl Into<String>,
    ) -> Self {
        let url: String = organization_url.into();
        Self {
            organization_url: url.trim_end_matches('/').to_owned(),
            project_id,
            project_name: project_name.into(),
        }
    }

    /// Returns the organization base URL without a trailing slash.
    #[must_use]
    pub fn organization_url(&self) -> &str {
        &self.organization_url
    }

    /// Returns the project identifier.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the project name.
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }
}

/// Complete context required by lifecycle sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowContext {
    /// Organization and project scope.
    pub scope: ProjectScope,
    /// Repository the sequences act on remotely.
    pub repository: RepositoryId,
    /// Identity written to `System.AssignedTo` when work starts.
    pub current_user: String,
    /// Prefix prepended to proposed branch names.
    pub branch_prefix: String,
    /// Shared mainline branch.
    pub integration_branch: super::BranchName,
    /// Remote the integration branch is tracked from.
    pub remote: String,
    /// State written when work starts.
    pub in_progress_state: String,
    /// State written when work finishes.
    pub resolved_state: String,
}
