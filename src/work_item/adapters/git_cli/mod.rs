//! Version-control adapter that shells out to the `git` CLI.

use crate::work_item::{
    domain::BranchName,
    ports::{VersionControl, VersionControlError, VersionControlResult},
};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

const DEFAULT_GIT_BINARY: &str = "git";

/// `git` CLI bound to one working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    binary: PathBuf,
    root: PathBuf,
    remote: String,
}

impl GitCli {
    /// Binds to the working tree at `root`, pushing to `remote`.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>, remote: impl Into<String>) -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_GIT_BINARY),
            root: root.into(),
            remote: remote.into(),
        }
    }

    /// Binds to the working tree enclosing the first folder that lies inside
    /// one.
    ///
    /// Each folder is searched upwards for a `.git` entry, so a folder nested
    /// inside a checkout resolves to the checkout root. Later repositories
    /// are ignored.
    #[must_use]
    pub fn discover<P: AsRef<Path>>(folders: &[P], remote: &str) -> Option<Self> {
        let root = folders
            .iter()
            .find_map(|folder| enclosing_working_tree(folder.as_ref()))?;
        tracing::debug!(root = %root.display(), "using git working tree");
        Some(Self::open(root, remote))
    }

    /// Uses a specific `git` executable.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Returns the working tree root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn run_raw(&self, args: &[OsString]) -> VersionControlResult<Output> {
        Command::new(&self.binary)
            .args(args)
            .current_dir(&self.root)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(VersionControlError::unavailable)
    }

    async fn run(&self, args: &[OsString]) -> VersionControlResult<Output> {
        let output = self.run_raw(args).await?;
        if output.status.success() {
            return Ok(output);
        }
        Err(self.command_failed(args, &output))
    }

    fn command_failed(&self, args: &[OsString], output: &Output) -> VersionControlError {
        let error = VersionControlError::CommandFailed {
            command: format!("{} {}", self.binary.display(), render_args(args)),
            detail: command_output_detail(output),
        };
        tracing::debug!(%error, "git command failed");
        error
    }
}

fn enclosing_working_tree(folder: &Path) -> Option<&Path> {
    folder
        .ancestors()
        .find(|candidate| candidate.join(".git").exists())
}

fn git_args<const N: usize>(parts: [&str; N]) -> Vec<OsString> {
    parts.into_iter().map(OsString::from).collect()
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn command_output_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    if !stderr.is_empty() {
        return stderr;
    }

    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if !stdout.is_empty() {
        return stdout;
    }

    output.status.to_string()
}

#[async_trait]
impl VersionControl for GitCli {
    async fn fetch(&self) -> VersionControlResult<()> {
        self.run(&git_args(["fetch", self.remote.as_str()])).await?;
        Ok(())
    }

    async fn checkout(&self, branch: &BranchName) -> VersionControlResult<()> {
        self.run(&git_args(["checkout", branch.as_str()])).await?;
        Ok(())
    }

    async fn pull(&self) -> VersionControlResult<()> {
        self.run(&git_args(["pull"])).await?;
        Ok(())
    }

    async fn push(&self) -> VersionControlResult<()> {
        let args = git_args(["push", "--set-upstream", self.remote.as_str(), "HEAD"]);
        self.run(&args).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &BranchName) -> VersionControlResult<()> {
        let args = git_args(["branch", "-d", branch.as_str()]);
        self.run(&args).await?;
        Ok(())
    }

    async fn rebase(&self, onto: &str) -> VersionControlResult<()> {
        self.run(&git_args(["rebase", onto])).await?;
        Ok(())
    }

    async fn remote_url(&self, remote: &str) -> VersionControlResult<Option<String>> {
        let args = git_args(["remote", "get-url", remote]);
        let output = self.run_raw(&args).await?;
        if !output.status.success() {
            return Ok(None);
        }
        let url = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        Ok(Some(url).filter(|value| !value.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[cfg(unix)]
    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[cfg(unix)]
    #[rstest]
    #[case::prefers_stderr(output(1, "out", "error: pathspec"), "error: pathspec")]
    #[case::falls_back_to_stdout(output(1, "nothing to commit", ""), "nothing to commit")]
    #[case::falls_back_to_status(output(1, "", "  "), "exit status: 1")]
    fn failure_detail_prefers_stderr(#[case] output: Output, #[case] expected: &str) {
        assert_eq!(command_output_detail(&output), expected);
    }

    #[rstest]
    fn discover_picks_first_repository() {
        let outside = tempfile::tempdir().expect("tempdir");
        let first = tempfile::tempdir().expect("tempdir");
        let second = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(first.path().join(".git")).expect("marker");
        std::fs::create_dir(second.path().join(".git")).expect("marker");

        let folders = [outside.path(), first.path(), second.path()];
        let cli = GitCli::discover(&folders, "origin").expect("repository found");
        assert_eq!(cli.root(), first.path());
    }

    #[rstest]
    fn discover_walks_up_from_a_nested_folder() {
        let checkout = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(checkout.path().join(".git")).expect("marker");
        let nested = checkout.path().join("src").join("bin");
        std::fs::create_dir_all(&nested).expect("nested folder");

        let cli = GitCli::discover(&[nested], "origin").expect("repository found");
        assert_eq!(cli.root(), checkout.path());
    }

    #[rstest]
    fn discover_without_repository_is_none() {
        let folder = tempfile::tempdir().expect("tempdir");
        assert!(GitCli::discover(&[folder.path()], "origin").is_none());
    }

    #[rstest]
    fn rendered_command_joins_arguments() {
        assert_eq!(render_args(&git_args(["branch", "-d", "x"])), "branch -d x");
    }
}
