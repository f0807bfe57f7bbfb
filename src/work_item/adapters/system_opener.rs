//! URL opener that delegates to the platform's default browser launcher.

use crate::work_item::ports::{OpenerError, UrlOpener};
use async_trait::async_trait;
use tokio::process::Command;

#[cfg(target_os = "macos")]
const LAUNCHER: (&str, &[&str]) = ("open", &[]);
#[cfg(target_os = "windows")]
const LAUNCHER: (&str, &[&str]) = ("cmd", &["/C", "start", ""]);
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const LAUNCHER: (&str, &[&str]) = ("xdg-open", &[]);

/// Opens URLs with `xdg-open`, `open` or `start`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemUrlOpener;

#[async_trait]
impl UrlOpener for SystemUrlOpener {
    async fn open(&self, url: &str) -> Result<(), OpenerError> {
        let (program, prefix) = LAUNCHER;
        let status = Command::new(program)
            .args(prefix)
            .arg(url)
            .status()
            .await
            .map_err(|err| OpenerError::new(url, err))?;
        if status.success() {
            tracing::debug!(%url, "url handed to browser");
            return Ok(());
        }
        Err(OpenerError::new(
            url,
            std::io::Error::other(format!("{program} exited with {status}")),
        ))
    }
}
