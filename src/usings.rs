//! Namespace-import repair for freshly generated sources.
//!
//! Kiota occasionally emits code referencing types whose `using` directive
//! it forgot. This fixer compiles the project, scans the unresolved-name
//! diagnostics (CS0246/CS0103), maps the type names it recognises to their
//! namespaces and prepends the missing directives, then compiles again.
//! It repeats until a pass finds nothing to fix or `max_passes` is reached.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::contract::{ImportsFixer, ServiceError};

/// Default [`ImportsFixer`] driven by `dotnet build` diagnostics.
pub struct DotnetImportsFixer {
    diagnostic: Regex,
}

impl DotnetImportsFixer {
    pub fn new() -> Self {
        // MSBuild console format: Path/File.cs(12,34): error CS0246: The type
        // or namespace name 'Foo' could not be found ...
        let diagnostic = Regex::new(
            r"(?m)^\s*(?P<file>[^\s(][^(]*\.cs)\(\d+,\d+\): error CS(?:0246|0103): [^']*'(?P<name>[A-Za-z0-9_.]+)'",
        )
        .expect("diagnostic pattern is valid");
        Self { diagnostic }
    }

    /// Namespaces for the type names the generator is known to leave
    /// unimported. Unknown names are reported and skipped.
    fn namespace_for(name: &str) -> Option<&'static str> {
        match name {
            "List" | "Dictionary" | "HashSet" | "IEnumerable" | "KeyValuePair" => {
                Some("System.Collections.Generic")
            }
            "Task" | "ValueTask" => Some("System.Threading.Tasks"),
            "CancellationToken" => Some("System.Threading"),
            "DateTimeOffset" | "Guid" | "Uri" | "TimeSpan" => Some("System"),
            "JsonSerializer" | "JsonElement" => Some("System.Text.Json"),
            "HttpClient" | "HttpRequestMessage" => Some("System.Net.Http"),
            "Regex" => Some("System.Text.RegularExpressions"),
            _ => None,
        }
    }

    async fn collect_diagnostics(
        &self,
        descriptor: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, String)>, ServiceError> {
        let descriptor = descriptor.display().to_string();
        let output = Command::new("dotnet")
            .args(["build", descriptor.as_str(), "--nologo"])
            .stdin(Stdio::null())
            .output();

        let output = tokio::select! {
            out = output => out.map_err(|e| format!("failed to spawn dotnet build: {e}"))?,
            _ = cancel.cancelled() => return Err("import repair cancelled".into()),
        };

        let text = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        let mut found = Vec::new();
        for capture in self.diagnostic.captures_iter(&text) {
            found.push((capture["file"].to_string(), capture["name"].to_string()));
        }
        Ok(found)
    }
}

impl Default for DotnetImportsFixer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImportsFixer for DotnetImportsFixer {
    async fn add_missing_imports(
        &self,
        descriptor: &Path,
        write_changes: bool,
        max_passes: u32,
        cancel: &CancellationToken,
    ) -> Result<(), ServiceError> {
        for pass in 1..=max_passes {
            let diagnostics = self.collect_diagnostics(descriptor, cancel).await?;
            if diagnostics.is_empty() {
                debug!(pass, "No unresolved names remain");
                return Ok(());
            }

            // file -> namespaces to prepend, deduplicated per pass
            let mut fixes: Vec<(String, BTreeSet<&'static str>)> = Vec::new();
            for (file, name) in &diagnostics {
                let Some(namespace) = Self::namespace_for(name) else {
                    warn!(name = %name, file = %file, "No known namespace for unresolved name");
                    continue;
                };
                match fixes.iter_mut().find(|(f, _)| f == file) {
                    Some((_, set)) => {
                        set.insert(namespace);
                    }
                    None => {
                        fixes.push((file.clone(), BTreeSet::from([namespace])));
                    }
                }
            }

            if fixes.is_empty() {
                warn!(pass, "Unresolved names remain but none are mappable, stopping");
                return Ok(());
            }
            if !write_changes {
                info!(pass, files = fixes.len(), "Dry run, not writing imports");
                return Ok(());
            }

            for (file, namespaces) in &fixes {
                let source = tokio::fs::read_to_string(file)
                    .await
                    .map_err(|e| format!("failed to read {file}: {e}"))?;
                let mut header = String::new();
                for namespace in namespaces {
                    let directive = format!("using {namespace};");
                    if !source.contains(&directive) {
                        header.push_str(&directive);
                        header.push('\n');
                    }
                }
                if header.is_empty() {
                    continue;
                }
                tokio::fs::write(file, format!("{header}{source}"))
                    .await
                    .map_err(|e| format!("failed to write {file}: {e}"))?;
                info!(file = %file, added = namespaces.len(), "Inserted missing using directives");
            }
        }

        warn!(max_passes, "Import repair passes exhausted");
        Ok(())
    }
}
