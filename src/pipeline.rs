//! High-level pipeline: checkout → spec download → regeneration → build → push.
//!
//! This module sequences one full regeneration run. Every step is awaited in
//! order; there is no parallelism and no retry. A failed checkout, download,
//! tool invocation or restore terminates the run. Only two places deviate
//! from fail-fast:
//!   - workspace pruning ([`crate::prune`]) is best effort and never fails,
//!   - a compile failure in the publish gate is a reported result: the run
//!     logs an error and finishes without pushing.
//!
//! # Major Types
//! - [`Pipeline`]: the orchestrator, generic over its collaborators so tests
//!   inject mocks
//! - [`RunReport`]: what one run did (for logs and downstream audit)
//!
//! # Cancellation
//! A single [`CancellationToken`] is threaded by reference through every
//! collaborator call. Any step observing it aborts the run; steps already
//! completed are not compensated (the clone stays on disk).

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::RunnerConfig;
use crate::contract::{BuildService, FileDownloader, GitClient, ImportsFixer, ProcessRunner, PushAuth};
use crate::fixer;
use crate::prune;

/// Outcome of one regeneration run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub workdir: std::path::PathBuf,
    pub built: bool,
    pub pushed: bool,
}

/// Sequences the regeneration task against injected collaborators.
pub struct Pipeline<G, D, P, B, F> {
    config: RunnerConfig,
    git: G,
    downloader: D,
    runner: P,
    build: B,
    imports: F,
}

impl<G, D, P, B, F> Pipeline<G, D, P, B, F>
where
    G: GitClient,
    D: FileDownloader,
    P: ProcessRunner,
    B: BuildService,
    F: ImportsFixer,
{
    pub fn new(
        config: RunnerConfig,
        git: G,
        downloader: D,
        runner: P,
        build: B,
        imports: F,
    ) -> Self {
        Self {
            config,
            git,
            downloader,
            runner,
            build,
            imports,
        }
    }

    /// Run the full pipeline once.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        info!(run_id = %run_id, library = %self.config.library_name, "Starting regeneration run");

        // Step 1: checkout into a fresh temp directory.
        let workdir = self
            .git
            .clone_to_temp(&self.config.remote_url(), cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("checkout failed")?;
        info!(path = %workdir.display(), "Checked out working copy");

        // Step 2: remove the stale spec, download the current one.
        let spec_path = self.config.spec_path(&workdir);
        match tokio::fs::remove_file(&spec_path).await {
            Ok(()) => info!(path = %spec_path.display(), "Removed stale spec"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(anyhow!(e)).with_context(|| {
                    format!("failed to remove stale spec {}", spec_path.display())
                })
            }
        }

        let downloaded = self
            .downloader
            .download(&self.config.spec_url, &spec_path, ".json", cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("spec download failed")?;
        let Some(spec_path) = downloaded else {
            bail!("spec endpoint {} returned no usable document", self.config.spec_url);
        };

        // Step 3: normalize the document before the generator sees it.
        fixer::normalize_spec(&spec_path).await?;

        // Step 4: bring the generator toolchain up to date.
        self.runner
            .run("dotnet", None, self.config.tool_update_args(), true, cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("generator toolchain update failed")?;

        // Step 5: reset the generated tree, keeping only the descriptor.
        prune::clean_generated_tree(
            &self.config.source_dir(&workdir),
            &self.config.descriptor_extension,
        );

        // Step 6: regenerate the client.
        self.runner
            .run(
                "kiota",
                Some(&workdir),
                self.config.generate_args(&spec_path),
                true,
                cancel,
            )
            .await
            .map_err(|e| anyhow!(e))
            .context("client generation failed")?;

        // Step 7: restore packages and repair the imports the generator omitted.
        let descriptor = self.config.descriptor_path(&workdir);
        self.build
            .restore(&descriptor, cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("dependency restore failed")?;
        self.imports
            .add_missing_imports(&descriptor, true, 5, cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("import repair failed")?;

        // Step 8: build gate, then publish.
        let (built, pushed) = self.build_and_push(&workdir, cancel).await?;

        info!(run_id = %run_id, built, pushed, "Regeneration run finished");
        Ok(RunReport {
            run_id,
            workdir,
            built,
            pushed,
        })
    }

    /// Publish only behind a successful release build. A reported build
    /// failure is not an error: the run ends without pushing.
    async fn build_and_push(
        &self,
        workdir: &Path,
        cancel: &CancellationToken,
    ) -> Result<(bool, bool)> {
        let descriptor = self.config.descriptor_path(workdir);

        self.build
            .restore(&descriptor, cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("pre-build restore failed")?;

        let successful = self
            .build
            .build(&descriptor, true, &self.config.build_configuration, cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("build invocation failed")?;

        if !successful {
            error!(descriptor = %descriptor.display(), "Build was not successful, not pushing");
            return Ok((false, false));
        }

        // Credentials are read only now: a broken build must never get as
        // far as touching the remote.
        let auth = PushAuth::from_env()?;

        self.git
            .commit_and_push(workdir, &self.config.commit_message, &auth, cancel)
            .await
            .map_err(|e| anyhow!(e))
            .context("commit and push failed")?;

        Ok((true, true))
    }
}
