//! Shell-out process runner built on `tokio::process`.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::contract::{ProcessRunner, ServiceError};

/// Default [`ProcessRunner`]: spawns the program directly (no shell),
/// inheriting stdio so tool output lands in the job log.
pub struct ShellRunner;

#[async_trait]
impl ProcessRunner for ShellRunner {
    async fn run<'a>(
        &self,
        program: &str,
        working_dir: Option<&'a Path>,
        args: Vec<String>,
        wait_for_exit: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        info!(program, args = ?args, workdir = ?working_dir, "Starting process");

        let mut command = Command::new(program);
        command.args(&args).stdin(Stdio::null());
        if let Some(dir) = working_dir {
            command.current_dir(dir);
        }

        let mut child = command
            .spawn()
            .map_err(|e| format!("failed to spawn {program}: {e}"))?;

        if !wait_for_exit {
            return Ok(());
        }

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| format!("failed to wait for {program}: {e}"))?;
                if status.success() {
                    Ok(())
                } else {
                    Err(format!("{program} exited with status {status}").into())
                }
            }
            _ = cancel.cancelled() => {
                warn!(program, "Cancellation requested, killing process");
                let _ = child.kill().await;
                Err(format!("{program} cancelled").into())
            }
        }
    }
}
