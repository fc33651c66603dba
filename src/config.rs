//! Runner configuration: the target library, the endpoints derived from it
//! and the fixed knobs of the regeneration task.
//!
//! Everything here is either a compiled-in default or an environment
//! variable. There are no CLI flags and no config files: the runner is meant
//! to execute unattended inside a scheduled job.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::contract::PushAuth;

/// Environment variable overriding the default target library.
pub const ENV_LIBRARY_NAME: &str = "RUNNER_LIBRARY_NAME";
/// Environment variable overriding the default spec endpoint.
pub const ENV_SPEC_URL: &str = "RUNNER_SPEC_URL";

/// All parameters of one regeneration run.
///
/// Injected into the pipeline at construction, so tests and alternate
/// deployments can retarget the runner without recompiling.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerConfig {
    /// Package/namespace name of the generated client, e.g. `Soenneker.X.OpenApiClient`.
    pub library_name: String,
    /// Class name the generator gives the client entrypoint.
    pub client_class_name: String,
    /// Endpoint serving the vendor's OpenAPI document.
    pub spec_url: String,
    /// Base URL the repository remote is templated from.
    pub remote_base: String,
    /// File name the downloaded spec is stored under, inside the clone root.
    pub spec_file_name: String,
    /// Subdirectory of the clone that holds generated sources.
    pub source_subdir: String,
    /// Extension of the project descriptor the pruner must preserve.
    pub descriptor_extension: String,
    /// Target language passed to the generator.
    pub generator_language: String,
    /// Build configuration used for the publish gate.
    pub build_configuration: String,
    /// Commit message for the automated push.
    pub commit_message: String,
}

impl RunnerConfig {
    /// Defaults for a given library, reproducing the original maintenance
    /// task layout (spec at the clone root, sources under `src/`).
    pub fn for_library(library_name: impl Into<String>) -> Self {
        let library_name = library_name.into();
        // The vendor prefix is not part of the generated class name:
        // Soenneker.X.OpenApiClient generates XOpenApiClient.
        let client_class_name: String = library_name
            .split('.')
            .filter(|segment| *segment != "Soenneker")
            .collect();
        Self {
            library_name,
            client_class_name,
            spec_url: "https://api.x.com/2/openapi.json".to_string(),
            remote_base: "https://github.com/soenneker".to_string(),
            spec_file_name: "openapi.json".to_string(),
            source_subdir: "src".to_string(),
            descriptor_extension: ".csproj".to_string(),
            generator_language: "CSharp".to_string(),
            build_configuration: "Release".to_string(),
            commit_message: "Automated update".to_string(),
        }
    }

    /// Build the config from compiled-in defaults plus optional environment
    /// overrides for the library name and spec endpoint.
    pub fn from_env() -> Self {
        let library = std::env::var(ENV_LIBRARY_NAME)
            .unwrap_or_else(|_| "Soenneker.X.OpenApiClient".to_string());
        let mut config = Self::for_library(library);
        if let Ok(url) = std::env::var(ENV_SPEC_URL) {
            config.spec_url = url;
        }
        config
    }

    pub fn trace_loaded(&self) {
        info!(
            library = %self.library_name,
            spec_url = %self.spec_url,
            remote = %self.remote_url(),
            "Loaded runner config"
        );
    }

    /// The repository remote, templated from the library name.
    pub fn remote_url(&self) -> String {
        format!("{}/{}", self.remote_base, self.library_name.to_lowercase())
    }

    /// Where the downloaded spec lives inside the clone.
    pub fn spec_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.spec_file_name)
    }

    /// The generated source tree the pruner resets.
    pub fn source_dir(&self, workdir: &Path) -> PathBuf {
        workdir.join(&self.source_subdir)
    }

    /// Deterministic descriptor path: source dir + library-derived file name.
    pub fn descriptor_path(&self, workdir: &Path) -> PathBuf {
        self.source_dir(workdir)
            .join(format!("{}{}", self.library_name, self.descriptor_extension))
    }

    /// Arguments for updating the generator toolchain.
    pub fn tool_update_args(&self) -> Vec<String> {
        ["tool", "update", "--global", "Microsoft.OpenApi.Kiota"]
            .map(String::from)
            .to_vec()
    }

    /// Arguments for one `kiota generate` invocation against `spec_path`.
    pub fn generate_args(&self, spec_path: &Path) -> Vec<String> {
        vec![
            "generate".to_string(),
            "-l".to_string(),
            self.generator_language.clone(),
            "-d".to_string(),
            spec_path.display().to_string(),
            "-o".to_string(),
            self.source_subdir.clone(),
            "-c".to_string(),
            self.client_class_name.clone(),
            "-n".to_string(),
            self.library_name.clone(),
            "--ebc".to_string(),
            "--cc".to_string(),
        ]
    }
}

/// Read a required environment variable, failing with context when absent.
pub fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("required environment variable {name} is not set"))
}

impl PushAuth {
    /// Publish credentials from the process environment. Fatal when any
    /// variable is missing; called only after a successful build.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            token: require_env("GH__TOKEN")?,
            committer_name: require_env("GIT__NAME")?,
            committer_email: require_env("GIT__EMAIL")?,
        })
    }
}
