use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::app::Result;
use crate::fetcher::filename::{name_from_url, split_name, FilenameAllocator};
use crate::fetcher::{DirectFetch, FetchConfig, TierFailure, TierOutcome};

/// Direct tier backed by reqwest.
///
/// A fetch only counts when the server answers with a success status and a
/// `Content-Type` containing the expected kind. With no expected kind every
/// successful response is saved.
pub struct HttpFetcher {
    client: Client,
    expected_content_type: Option<String>,
    extension: String,
    allocator: FilenameAllocator,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        // Idle bounds only: a body that keeps arriving is never cut off
        let client = Client::builder()
            .connect_timeout(config.direct_timeout())
            .read_timeout(config.direct_timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            expected_content_type: Some(config.content_type.to_lowercase()),
            extension: config.extension.clone(),
            allocator: FilenameAllocator::new(),
        })
    }

    /// Accept any content type, e.g. for bulk URL lists.
    pub fn accept_any(mut self) -> Self {
        self.expected_content_type = None;
        self
    }

    async fn fetch_to(
        &self,
        url: &str,
        dir: &Path,
        base_name: &str,
        ext: &str,
    ) -> std::result::Result<PathBuf, TierFailure> {
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TierFailure::Status(status.as_u16()));
        }

        if let Some(expected) = &self.expected_content_type {
            let declared = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_lowercase();
            if !declared.contains(expected.as_str()) {
                return Err(TierFailure::ContentType(declared));
            }
        }

        let (path, mut file) = self.allocator.create_unique(dir, base_name, ext).await?;

        let written = async {
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
            }
            file.flush().await?;
            Ok::<_, TierFailure>(())
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        Ok(path)
    }

    /// Save whatever the URL serves, named after the URL's last segment.
    pub async fn download_named(&self, url: &str, dir: &Path) -> TierOutcome {
        let name = name_from_url(url).unwrap_or_else(|| "downloaded_file".to_string());
        let (stem, ext) = split_name(&name);

        match self.fetch_to(url, dir, stem, ext.unwrap_or("")).await {
            Ok(path) => TierOutcome::Saved(path),
            Err(e) => TierOutcome::Failed(e),
        }
    }
}

#[async_trait]
impl DirectFetch for HttpFetcher {
    async fn try_fetch(&self, url: &str, dir: &Path, base_name: &str) -> TierOutcome {
        tracing::info!("[direct] GET {}", url);
        match self.fetch_to(url, dir, base_name, &self.extension).await {
            Ok(path) => {
                tracing::info!("[direct] saved {}", path.display());
                TierOutcome::Saved(path)
            }
            Err(e) => {
                tracing::warn!("[direct] {} failed: {}", url, e);
                TierOutcome::Failed(e)
            }
        }
    }
}
