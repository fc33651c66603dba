//! # contract: interfaces for the pipeline's external collaborators
//!
//! This module defines the async traits the runner orchestrates: version
//! control, spec download, external process invocation, dependency
//! restore/build and namespace-import repair. Each trait is a narrow
//! capability the pipeline depends on by contract only.
//!
//! ## Interface & Extensibility
//! - All methods are async, returning results with boxed error types.
//! - Every method takes a [`CancellationToken`] by reference; implementors
//!   may observe it and abort early.
//! - Error handling is uniform: implementation errors are converted to a
//!   boxed trait object ([`ServiceError`]).
//!
//! ## Mocking & Testing
//! - Each trait is annotated for `mockall` (behind the `test-export-mocks`
//!   feature) so the orchestration and build-gate tests can run against
//!   deterministic mocks without network or subprocesses.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

/// Error type shared by all collaborator traits (simple boxed error).
pub type ServiceError = Box<dyn std::error::Error + Send + Sync>;

/// Committer identity plus the token required to push.
#[derive(Debug, Clone)]
pub struct PushAuth {
    pub token: String,
    pub committer_name: String,
    pub committer_email: String,
}

/// Version-control client: cloning a remote into a fresh directory and
/// publishing the result of a run.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GitClient: Send + Sync {
    /// Clone `remote_url` into a freshly created temporary directory and
    /// return its path. The directory is left behind for the OS to clean up.
    async fn clone_to_temp(
        &self,
        remote_url: &str,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ServiceError>;

    /// Stage everything under `workdir`, commit with `message` and push.
    /// A clean tree is not an error: implementors skip the push.
    async fn commit_and_push(
        &self,
        workdir: &Path,
        message: &str,
        auth: &PushAuth,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError>;
}

/// Downloads a single file to a fixed destination path.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FileDownloader: Send + Sync {
    /// Fetch `url` and write it to `dest`. `expected_extension` (e.g.
    /// `".json"`) guards against a destination that does not match the
    /// document being fetched. Returns `None` when the server responded
    /// without a usable body.
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        expected_extension: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<PathBuf>, ServiceError>;
}

/// Runs an external program. A non-zero exit status is an error, not a
/// result value.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Spawn `program` with `args`, optionally in `working_dir`. When
    /// `wait_for_exit` is false the child is left running and the call
    /// returns as soon as the spawn succeeded.
    async fn run<'a>(
        &self,
        program: &str,
        working_dir: Option<&'a Path>,
        args: Vec<String>,
        wait_for_exit: bool,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError>;
}

/// Dependency restore and compilation for a project descriptor.
///
/// `build` reports an ordinary compile failure as `Ok(false)`; only
/// infrastructure problems (toolchain missing, spawn failure) surface as
/// errors. The publish gate in the pipeline relies on that distinction.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BuildService: Send + Sync {
    async fn restore(
        &self,
        descriptor: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError>;

    async fn build(
        &self,
        descriptor: &Path,
        release: bool,
        configuration: &str,
        cancel: &CancellationToken,
    ) -> Result<bool, ServiceError>;
}

/// Repairs namespace imports the code generator tends to omit.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ImportsFixer: Send + Sync {
    /// Compile the project, map unresolved-name diagnostics to known
    /// namespaces and insert the missing import directives. Repeats up to
    /// `max_passes` times; with `write_changes` false the pass is dry-run.
    async fn add_missing_imports(
        &self,
        descriptor: &Path,
        write_changes: bool,
        max_passes: u32,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError>;
}
