//! Text snippets that reference a work item from elsewhere.

use super::WorkItemId;

/// Host whose remotes need the `AB` mention prefix.
const GITHUB_HOST: &str = "github.com";

/// Returns the `#<id> - <title>` reference copied to the clipboard.
#[must_use]
pub fn mention_text(id: WorkItemId, title: &str) -> String {
    format!("#{id} - {title}")
}

/// Returns the text to append to a commit message so that the commit
/// resolves the item.
///
/// Repositories hosted on GitHub need the `AB#` form; everything else uses
/// plain `#`.
#[must_use]
pub fn commit_mention(existing_message: &str, id: WorkItemId, remote_url: Option<&str>) -> String {
    let prefix = if remote_url.is_some_and(is_github_remote) {
        "AB"
    } else {
        ""
    };
    if existing_message.is_empty() {
        format!("Fix {prefix}#{id} ")
    } else {
        format!("\nFixes {prefix}#{id}")
    }
}

/// Returns true when the remote URL points at github.com.
///
/// Accepts both `https://user@github.com:443/...` and scp-style
/// `git@github.com:owner/repo` remotes.
#[must_use]
pub fn is_github_remote(remote_url: &str) -> bool {
    let without_scheme = remote_url
        .split_once("://")
        .map_or(remote_url, |(_, rest)| rest);
    let authority = without_scheme.split('/').next().unwrap_or_default();
    let host_and_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host)| host);
    let host = host_and_port.split(':').next().unwrap_or_default();
    host.eq_ignore_ascii_case(GITHUB_HOST)
}
