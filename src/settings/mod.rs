//! Board settings loaded from `boardsync.json` with environment overrides.
//!
//! A representative file is:
//!
//! ```json
//! {
//!   "organization_url": "https://dev.azure.com/contoso",
//!   "project_id": "6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
//!   "project_name": "Fabrikam",
//!   "repository": "fabrikam-web",
//!   "user": "ada@contoso.com",
//!   "branch_prefix": "users/ada/",
//!   "queries": [
//!     { "id": "a2108d31-086c-4fb0-afda-097e4cc46df4", "name": "My work" }
//!   ]
//! }
//! ```
//!
//! The personal access token is normally supplied through `BOARDSYNC_PAT`
//! rather than the file.

use crate::work_item::{
    adapters::azure::{AzureDevOpsConfig, DEFAULT_REQUEST_TIMEOUT},
    domain::{
        BranchName, MissingContext, ProjectId, ProjectScope, Query, QueryId, RepositoryId,
        WorkItemDomainError, WorkflowContext,
    },
    services::TreeContext,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// File read when `BOARDSYNC_CONFIG` is not set.
pub const DEFAULT_SETTINGS_FILE: &str = "boardsync.json";

/// Environment variable naming the settings file.
pub const ENV_CONFIG: &str = "BOARDSYNC_CONFIG";
/// Environment variable holding the personal access token.
pub const ENV_PAT: &str = "BOARDSYNC_PAT";
/// Environment variable overriding the organization URL.
pub const ENV_ORGANIZATION_URL: &str = "BOARDSYNC_ORGANIZATION_URL";
/// Environment variable overriding the project identifier.
pub const ENV_PROJECT_ID: &str = "BOARDSYNC_PROJECT_ID";
/// Environment variable overriding the project name.
pub const ENV_PROJECT_NAME: &str = "BOARDSYNC_PROJECT_NAME";
/// Environment variable overriding the repository.
pub const ENV_REPOSITORY: &str = "BOARDSYNC_REPOSITORY";
/// Environment variable overriding the current user.
pub const ENV_USER: &str = "BOARDSYNC_USER";
/// Environment variable overriding the branch prefix.
pub const ENV_BRANCH_PREFIX: &str = "BOARDSYNC_BRANCH_PREFIX";

const DEFAULT_INTEGRATION_BRANCH: &str = "master";
const DEFAULT_REMOTE: &str = "origin";
const DEFAULT_IN_PROGRESS_STATE: &str = "Active";
const DEFAULT_RESOLVED_STATE: &str = "Resolved";

/// Errors raised while loading or validating settings.
#[derive(Debug, Clone, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings from {}: {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The settings file is not valid JSON for [`Settings`].
    #[error("failed to parse settings: {0}")]
    Parse(Arc<serde_json::Error>),

    /// An environment override could not be parsed.
    #[error("{key} is invalid: {detail}")]
    InvalidOverride {
        /// Environment variable.
        key: &'static str,
        /// Parse failure.
        detail: String,
    },

    /// Part of the board context is not configured.
    #[error("board context incomplete: no {0} configured")]
    Incomplete(MissingContext),

    /// No personal access token is configured.
    #[error("no personal access token configured; set BOARDSYNC_PAT")]
    MissingToken,

    /// A configured value failed validation.
    #[error(transparent)]
    Invalid(#[from] WorkItemDomainError),
}

impl From<MissingContext> for SettingsError {
    fn from(missing: MissingContext) -> Self {
        Self::Incomplete(missing)
    }
}

/// Saved query entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySetting {
    /// Remote query identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// Raw board settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Organization base URL, for example `https://dev.azure.com/contoso`.
    pub organization_url: Option<String>,
    /// Project identifier.
    pub project_id: Option<Uuid>,
    /// Project name used in URLs.
    pub project_name: Option<String>,
    /// Repository name or identifier.
    pub repository: Option<String>,
    /// Identity assigned when work starts.
    pub user: Option<String>,
    /// Prefix prepended to proposed branch names.
    pub branch_prefix: String,
    /// Shared mainline branch.
    pub integration_branch: String,
    /// Remote the integration branch is tracked from.
    pub remote: String,
    /// State written when work starts.
    pub in_progress_state: String,
    /// State written when work finishes.
    pub resolved_state: String,
    /// Saved queries shown at the top level.
    pub queries: Vec<QuerySetting>,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Personal access token; prefer `BOARDSYNC_PAT`.
    #[serde(skip_serializing)]
    pub personal_access_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            organization_url: None,
            project_id: None,
            project_name: None,
            repository: None,
            user: None,
            branch_prefix: String::new(),
            integration_branch: DEFAULT_INTEGRATION_BRANCH.to_owned(),
            remote: DEFAULT_REMOTE.to_owned(),
            in_progress_state: DEFAULT_IN_PROGRESS_STATE.to_owned(),
            resolved_state: DEFAULT_RESOLVED_STATE.to_owned(),
            queries: Vec::new(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            personal_access_token: None,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("organization_url", &self.organization_url)
            .field("project_id", &self.project_id)
            .field("project_name", &self.project_name)
            .field("repository", &self.repository)
            .field("user", &self.user)
            .field("branch_prefix", &self.branch_prefix)
            .field("integration_branch", &self.integration_branch)
            .field("remote", &self.remote)
            .field("queries", &self.queries)
            .field(
                "personal_access_token",
                &self.personal_access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Parses settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed input.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        serde_json::from_str(json).map_err(|err| SettingsError::Parse(Arc::new(err)))
    }

    /// Reads settings from a file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] or [`SettingsError::Parse`].
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|err| SettingsError::Read {
            path: path.to_path_buf(),
            source: Arc::new(err),
        })?;
        Self::from_json(&json)
    }

    /// Loads settings the way the binary does.
    ///
    /// Reads `path` when given, otherwise the file named by
    /// `BOARDSYNC_CONFIG`, otherwise `boardsync.json` if it exists, then
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when an explicitly named file cannot be
    /// read or parsed, or an override is invalid.
    pub fn discover(path: Option<&Path>) -> Result<Self, SettingsError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));
        let base = match explicit {
            Some(file) => Self::load(&file)?,
            None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
                Self::load(Path::new(DEFAULT_SETTINGS_FILE))?
            }
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies `BOARDSYNC_*` overrides returned by `lookup`.
    ///
    /// Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidOverride`] when the project
    /// identifier is not a UUID.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = read(ENV_ORGANIZATION_URL) {
            self.organization_url = Some(url);
        }
        if let Some(raw) = read(ENV_PROJECT_ID) {
            let id = Uuid::parse_str(&raw).map_err(|err| SettingsError::InvalidOverride {
                key: ENV_PROJECT_ID,
                detail: err.to_string(),
            })?;
            self.project_id = Some(id);
        }
        if let Some(name) = read(ENV_PROJECT_NAME) {
            self.project_name = Some(name);
        }
        if let Some(repository) = read(ENV_REPOSITORY) {
            self.repository = Some(repository);
        }
        if let Some(user) = read(ENV_USER) {
            self.user = Some(user);
        }
        if let Some(prefix) = read(ENV_BRANCH_PREFIX) {
            self.branch_prefix = prefix;
        }
        if let Some(token) = read(ENV_PAT) {
            self.personal_access_token = Some(token);
        }
        Ok(self)
    }

    /// Returns true when an organization is configured.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        present(self.organization_url.as_deref()).is_some()
    }

    /// Returns the organization and project scope.
    ///
    /// # Errors
    ///
    /// Returns the first missing part of the context.
    pub fn project_scope(&self) -> Result<ProjectScope, MissingContext> {
        let organization =
            present(self.organization_url.as_deref()).ok_or(MissingContext::Organization)?;
        let project_name = present(self.project_name.as_deref()).ok_or(MissingContext::Project)?;
        let project_id = self.project_id.ok_or(MissingContext::Project)?;
        Ok(ProjectScope::new(
            organization,
            ProjectId::from_uuid(project_id),
            project_name,
        ))
    }

    /// Returns the saved queries.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for an empty query identifier.
    pub fn queries(&self) -> Result<Vec<Query>, SettingsError> {
        self.queries
            .iter()
            .map(|query| -> Result<Query, SettingsError> {
                Ok(Query::new(QueryId::new(query.id.as_str())?, query.name.as_str()))
            })
            .collect()
    }

    /// Returns the top-level tree context.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for an invalid query.
    pub fn tree_context(&self, workspace_open: bool) -> Result<TreeContext, SettingsError> {
        Ok(TreeContext {
            workspace_open,
            connected: self.is_connected(),
            queries: self.queries()?,
        })
    }

    /// Returns the context lifecycle sequences run in.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Incomplete`] when the organization, project,
    /// repository or user is missing and [`SettingsError::Invalid`] for an
    /// invalid integration branch.
    pub fn workflow_context(&self) -> Result<WorkflowContext, SettingsError> {
        let scope = self.project_scope()?;
        let repository = present(self.repository.as_deref()).ok_or(MissingContext::Repository)?;
        let user = present(self.user.as_deref()).ok_or(MissingContext::User)?;
        Ok(WorkflowContext {
            scope,
            repository: RepositoryId::new(repository)?,
            current_user: user.to_owned(),
            branch_prefix: self.branch_prefix.clone(),
            integration_branch: BranchName::new(self.integration_branch.as_str())?,
            remote: self.remote.clone(),
            in_progress_state: self.in_progress_state.clone(),
            resolved_state: self.resolved_state.clone(),
        })
    }

    /// Returns the HTTP client settings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingToken`] when no token is configured.
    pub fn azure_config(&self) -> Result<AzureDevOpsConfig, SettingsError> {
        let token = present(self.personal_access_token.as_deref())
            .ok_or(SettingsError::MissingToken)?;
        Ok(AzureDevOpsConfig {
            personal_access_token: token.to_owned(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
