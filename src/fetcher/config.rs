use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::fetcher::tiered::DEFAULT_SKIP_DOMAINS;

/// Configuration for the fetch run and the direct tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory documents are saved into (default: downloads)
    pub output_dir: PathBuf,

    /// Pause for the operator during the browser tier (default: false)
    pub interactive: bool,

    /// Connect and idle-read timeout of the direct tier in seconds (default: 15)
    pub direct_timeout_secs: u64,

    /// Content type a direct response must declare (default: application/pdf)
    pub content_type: String,

    /// Extension for saved documents, without the dot (default: pdf)
    pub extension: String,

    /// User agent sent by the direct tier
    pub user_agent: String,

    /// Host substrings for which the direct tier is never tried
    pub skip_domains: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            interactive: false,
            direct_timeout_secs: 15,
            content_type: "application/pdf".to_string(),
            extension: "pdf".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            skip_domains: DEFAULT_SKIP_DOMAINS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

impl FetchConfig {
    pub fn direct_timeout(&self) -> Duration {
        Duration::from_secs(self.direct_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = FetchConfig::default();
        assert_eq!(config.output_dir, PathBuf::from("downloads"));
        assert!(!config.interactive);
        assert_eq!(config.direct_timeout(), Duration::from_secs(15));
        assert_eq!(config.content_type, "application/pdf");
        assert_eq!(config.extension, "pdf");
        assert_eq!(config.skip_domains.len(), 8);
        assert!(config.skip_domains.contains(&"pnas.org".to_string()));
    }
}
