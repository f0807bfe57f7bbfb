//! Branch value objects: validated names, artifact links and resolved refs.

use super::{BranchLinkError, ProjectId, RepositoryId, WorkItemDomainError, WorkItemId};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a validated branch name.
const MAX_BRANCH_NAME_LENGTH: usize = 250;

/// Maximum length of a proposed branch name, prefix included.
const MAX_PROPOSED_BRANCH_NAME_LENGTH: usize = 100;

/// Scheme and path prefix of git ref artifact links.
pub const GIT_REF_LINK_PREFIX: &str = "vstfs:///Git/Ref/";

/// Marker separating the repository segment from the branch name.
const BRANCH_MARKER: &str = "/GB";

/// Path position of the repository id in a decoded link.
const REPOSITORY_FIELD: usize = 6;

/// Characters escaped when a value is embedded as a single URI component.
///
/// Matches the set left alone by ECMAScript `encodeURIComponent`, which is
/// what the remote service produces and expects.
pub const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Validated git branch name (without the `refs/heads/` prefix).
///
/// # Examples
///
///     use boardsync::work_item::domain::BranchName;
///
///     let name = BranchName::new("feature/42-fix-login").expect("valid");
///     assert_eq!(name.as_str(), "feature/42-fix-login");
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Creates a validated branch name.
    ///
    /// # Errors
    ///
    /// Returns [`WorkItemDomainError::InvalidBranchName`] when the value is
    /// empty, contains whitespace, a colon or `..`, or exceeds the length
    /// limit.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkItemDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if Self::is_invalid_branch_name(normalized) {
            return Err(WorkItemDomainError::InvalidBranchName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    fn is_invalid_branch_name(name: &str) -> bool {
        let is_empty = name.is_empty();
        let contains_forbidden_char = name.chars().any(|ch| ch == ':' || ch.is_whitespace());
        let contains_parent_step = name.contains("..");
        let exceeds_length_limit = name.len() > MAX_BRANCH_NAME_LENGTH;

        is_empty || contains_forbidden_char || contains_parent_step || exceeds_length_limit
    }

    /// Returns the branch name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the fully qualified ref name.
    #[must_use]
    pub fn to_ref_name(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = WorkItemDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BranchName> for String {
    fn from(value: BranchName) -> Self {
        value.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decoded branch artifact link attached to a work item.
///
/// The remote form is
/// `vstfs:///Git/Ref/<scope-id>%2F<repo-id>%2FGB<branch-name>`; everything
/// after the scheme prefix is a single encoded URI component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchLink {
    decoded: String,
    repository: RepositoryId,
    branch_name: BranchName,
}

impl BranchLink {
    /// Decodes a raw artifact link.
    ///
    /// # Errors
    ///
    /// Returns a [`BranchLinkError`] when the link is not UTF-8 after
    /// decoding, has no `/GB` marker, has no repository segment, or carries
    /// an invalid branch name.
    pub fn decode(raw: &str) -> Result<Self, BranchLinkError> {
        let decoded = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| BranchLinkError::Encoding(raw.to_owned()))?
            .into_owned();

        let (head, branch) = decoded
            .split_once(BRANCH_MARKER)
            .ok_or_else(|| BranchLinkError::MissingBranchMarker(decoded.clone()))?;

        let repository = head
            .split('/')
            .nth(REPOSITORY_FIELD)
            .and_then(|segment| RepositoryId::new(segment).ok())
            .ok_or_else(|| BranchLinkError::MissingRepository(decoded.clone()))?;

        let branch_name = BranchName::new(branch)
            .map_err(|_| BranchLinkError::InvalidBranchName(decoded.clone()))?;

        Ok(Self {
            decoded,
            repository,
            branch_name,
        })
    }

    /// Encodes the artifact link for a branch created in `project`.
    #[must_use]
    pub fn encode(project: ProjectId, repository: &RepositoryId, branch: &BranchName) -> String {
        let component = format!("{project}/{repository}{BRANCH_MARKER}{branch}");
        format!(
            "{GIT_REF_LINK_PREFIX}{}",
            utf8_percent_encode(&component, URI_COMPONENT)
        )
    }

    /// Returns the fully decoded link, used as the per-pass memo key.
    #[must_use]
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// Returns the repository identifier.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    /// Returns the branch name.
    #[must_use]
    pub const fn branch_name(&self) -> &BranchName {
        &self.branch_name
    }
}

/// Branch statistics as reported by the remote git API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchStats {
    /// Branch name as reported remotely.
    pub name: String,
    /// Commits on the branch not on the base branch.
    pub ahead_count: u32,
    /// Commits on the base branch not on the branch.
    pub behind_count: u32,
    /// Head commit id, when reported.
    pub commit_id: Option<String>,
}

/// Resolved branch linked to a work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchRef {
    repository: RepositoryId,
    name: BranchName,
    ahead_count: u32,
    behind_count: u32,
    commit_id: Option<String>,
}

impl BranchRef {
    /// Combines a decoded link with the remote statistics for its branch.
    ///
    /// The link's branch name is authoritative; the remote name is ignored.
    #[must_use]
    pub(crate) fn resolved(link: &BranchLink, stats: BranchStats) -> Self {
        Self {
            repository: link.repository().clone(),
            name: link.branch_name().clone(),
            ahead_count: stats.ahead_count,
            behind_count: stats.behind_count,
            commit_id: stats.commit_id,
        }
    }

    /// Returns the repository identifier.
    #[must_use]
    pub const fn repository(&self) -> &RepositoryId {
        &self.repository
    }

    /// Returns the branch name.
    #[must_use]
    pub const fn name(&self) -> &BranchName {
        &self.name
    }

    /// Returns how many commits the branch is ahead of the integration
    /// branch.
    #[must_use]
    pub const fn ahead_count(&self) -> u32 {
        self.ahead_count
    }

    /// Returns how many commits the branch is behind the integration
    /// branch.
    #[must_use]
    pub const fn behind_count(&self) -> u32 {
        self.behind_count
    }

    /// Returns the head commit id, when known.
    #[must_use]
    pub fn commit_id(&self) -> Option<&str> {
        self.commit_id.as_deref()
    }
}

/// Proposes a branch name for a work item.
///
/// The title is lowercased, stripped of everything except ASCII
/// alphanumerics and spaces, trimmed, and each run of spaces becomes a
/// single hyphen. The result is `<prefix><id>-<slug>`. Long slugs are cut
/// at a word boundary so the proposal stays within 100 characters.
///
/// # Examples
///
///     use boardsync::work_item::domain::{WorkItemId, propose_branch_name};
///
///     let id = WorkItemId::new(7).expect("valid");
///     assert_eq!(
///         propose_branch_name("users/me/", id, "Fix Login Bug!!"),
///         "users/me/7-fix-login-bug"
///     );
#[must_use]
pub fn propose_branch_name(prefix: &str, id: WorkItemId, title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == ' ')
        .collect();
    let head = format!("{prefix}{id}-");
    let budget = MAX_PROPOSED_BRANCH_NAME_LENGTH.saturating_sub(head.len());
    format!("{head}{}", slug_within(&kept, budget))
}

/// Joins the words of `kept` with hyphens, dropping trailing words that
/// would exceed `budget`. A first word longer than `budget` is cut.
fn slug_within(kept: &str, budget: usize) -> String {
    let mut slug = String::new();
    for word in kept.split_whitespace() {
        let separator = usize::from(!slug.is_empty());
        if slug.len() + separator + word.len() > budget {
            if slug.is_empty() {
                slug.extend(word.chars().take(budget));
            }
            break;
        }
        if separator == 1 {
            slug.push('-');
        }
        slug.push_str(word);
    }
    slug
}
