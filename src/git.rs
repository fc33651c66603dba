//! Version-control client that shells out to the `git` binary.
//!
//! Each run clones into its own freshly created temp directory; the
//! directory is deliberately persisted (not removed on drop) so the rest of
//! the pipeline can keep working in it, and is left for the OS temp cleanup
//! afterwards.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::contract::{GitClient, PushAuth, ServiceError};

pub struct ShellGit;

impl ShellGit {
    async fn git(
        &self,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<String, ServiceError> {
        debug!(args = ?args, "Running git");
        let child = Command::new("git")
            .args(args)
            .output();

        let output = tokio::select! {
            out = child => out.map_err(|e| format!("failed to spawn git: {e}"))?,
            _ = cancel.cancelled() => return Err("git invocation cancelled".into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("git {} failed: {}", args.first().unwrap_or(&""), stderr.trim()).into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl GitClient for ShellGit {
    async fn clone_to_temp(
        &self,
        remote_url: &str,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ServiceError> {
        let dir = tempfile::Builder::new()
            .prefix("openapi-client-runner-")
            .tempdir()
            .map_err(|e| format!("failed to create temp directory: {e}"))?
            .keep();

        let target = dir.display().to_string();
        self.git(&["clone", remote_url, &target], cancel).await?;
        info!(remote = remote_url, path = %dir.display(), "Cloned repository");
        Ok(dir)
    }

    async fn commit_and_push(
        &self,
        workdir: &Path,
        message: &str,
        auth: &PushAuth,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        let dir = workdir.display().to_string();

        self.git(&["-C", &dir, "add", "-A"], cancel).await?;

        let status = self
            .git(&["-C", &dir, "status", "--porcelain"], cancel)
            .await?;
        if status.trim().is_empty() {
            info!(path = %workdir.display(), "Working tree clean, nothing to push");
            return Ok(());
        }

        self.git(
            &[
                "-C",
                &dir,
                "-c",
                &format!("user.name={}", auth.committer_name),
                "-c",
                &format!("user.email={}", auth.committer_email),
                "commit",
                "-m",
                message,
            ],
            cancel,
        )
        .await?;

        let remote = self
            .git(&["-C", &dir, "remote", "get-url", "origin"], cancel)
            .await?;
        let authed = authenticated_remote(remote.trim(), &auth.token)?;

        self.git(&["-C", &dir, "push", &authed, "HEAD"], cancel)
            .await?;
        info!(path = %workdir.display(), "Committed and pushed");
        Ok(())
    }
}

/// Splice the token into an https remote. The token never appears in logs.
fn authenticated_remote(remote: &str, token: &str) -> Result<String, ServiceError> {
    let rest = remote
        .strip_prefix("https://")
        .ok_or_else(|| format!("remote is not an https URL: {remote}"))?;
    Ok(format!("https://{token}@{rest}"))
}
