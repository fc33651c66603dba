//! Normalization of the downloaded OpenAPI document.
//!
//! The vendor endpoint serves minified JSON whose key order is not stable
//! between fetches. Rewriting the document pretty-printed keeps the checked
//! in spec diffable and catches a truncated or non-JSON response before the
//! generator runs against it.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

/// Parse the spec at `path` and rewrite it pretty-printed in place.
pub async fn normalize_spec(path: &Path) -> Result<()> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read spec at {}", path.display()))?;

    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("spec at {} is not valid JSON", path.display()))?;

    let pretty = serde_json::to_string_pretty(&document).context("failed to serialize spec")?;
    tokio::fs::write(path, pretty)
        .await
        .with_context(|| format!("failed to write spec at {}", path.display()))?;

    info!(path = %path.display(), "Normalized OpenAPI document");
    Ok(())
}
