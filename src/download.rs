//! HTTP file download, used to fetch the vendor's OpenAPI document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::contract::{FileDownloader, ServiceError};

/// Default [`FileDownloader`] backed by `reqwest`.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileDownloader for HttpDownloader {
    async fn download(
        &self,
        url: &str,
        dest: &Path,
        expected_extension: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<PathBuf>, ServiceError> {
        let suffix = expected_extension.to_lowercase();
        let matches_extension = dest
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_lowercase().ends_with(&suffix))
            .unwrap_or(false);
        if !matches_extension {
            return Err(format!(
                "destination {} does not match expected extension {expected_extension}",
                dest.display()
            )
            .into());
        }

        let request = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.bytes().await
        };
        let body = tokio::select! {
            body = request => body.map_err(|e| format!("download of {url} failed: {e}"))?,
            _ = cancel.cancelled() => return Err(format!("download of {url} cancelled").into()),
        };

        if body.is_empty() {
            warn!(url, "Server returned an empty body, nothing written");
            return Ok(None);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
        }
        tokio::fs::write(dest, &body)
            .await
            .map_err(|e| format!("failed to write {}: {e}", dest.display()))?;

        info!(url, path = %dest.display(), bytes = body.len(), "Downloaded file");
        Ok(Some(dest.to_path_buf()))
    }
}
