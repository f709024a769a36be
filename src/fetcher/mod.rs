pub mod config;
pub mod filename;
pub mod http_fetcher;
pub mod tiered;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use config::FetchConfig;
pub use filename::FilenameAllocator;
pub use http_fetcher::HttpFetcher;
pub use tiered::{FetchPolicy, SkipPolicy, TieredFetcher};

/// Why a single tier gave up on a link. Never fatal to the batch.
#[derive(Error, Debug)]
pub enum TierFailure {
    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("unexpected content type {0:?}")]
    ContentType(String),

    #[error("browser unavailable: {0}")]
    Environment(String),

    #[error("no document link found on page")]
    NoCandidate,

    #[error("failed to write file: {0}")]
    Write(#[from] std::io::Error),
}

impl From<reqwest::Error> for TierFailure {
    fn from(e: reqwest::Error) -> Self {
        TierFailure::Network(e.to_string())
    }
}

#[derive(Debug)]
pub enum TierOutcome {
    /// Document written to disk
    Saved(PathBuf),
    Failed(TierFailure),
}

impl TierOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, TierOutcome::Saved(_))
    }
}

/// Cheap tier: plain HTTP retrieval of a link that should point straight at
/// the document.
#[async_trait]
pub trait DirectFetch: Send + Sync {
    async fn try_fetch(&self, url: &str, dir: &Path, base_name: &str) -> TierOutcome;
}
