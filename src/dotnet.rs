//! Dependency restore and compilation via the `dotnet` CLI.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::contract::{BuildService, ServiceError};

/// Default [`BuildService`] shelling out to `dotnet`.
///
/// `restore` treats a non-zero exit as an error; `build` reports it as
/// `Ok(false)` so the caller can gate publishing on the outcome.
pub struct DotnetCli;

impl DotnetCli {
    async fn dotnet(
        &self,
        args: &[&str],
        cancel: &CancellationToken,
    ) -> Result<bool, ServiceError> {
        let mut child = Command::new("dotnet")
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| format!("failed to spawn dotnet: {e}"))?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| format!("failed to wait for dotnet: {e}"))?;
                Ok(status.success())
            }
            _ = cancel.cancelled() => {
                warn!("Cancellation requested, killing dotnet");
                let _ = child.kill().await;
                Err("dotnet invocation cancelled".into())
            }
        }
    }
}

#[async_trait]
impl BuildService for DotnetCli {
    async fn restore(
        &self,
        descriptor: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        info!(descriptor = %descriptor.display(), "Restoring dependencies");
        let descriptor = descriptor.display().to_string();
        if self.dotnet(&["restore", &descriptor], cancel).await? {
            Ok(())
        } else {
            Err(format!("dotnet restore failed for {descriptor}").into())
        }
    }

    async fn build(
        &self,
        descriptor: &Path,
        release: bool,
        configuration: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ServiceError> {
        info!(descriptor = %descriptor.display(), configuration, "Building project");
        let descriptor = descriptor.display().to_string();
        let mut args: Vec<&str> = vec!["build", &descriptor, "--no-restore"];
        if release {
            args.extend(["-c", configuration]);
        }
        self.dotnet(&args, cancel).await
    }
}
