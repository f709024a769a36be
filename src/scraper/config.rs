use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::scraper::extractor::LinkSelector;

/// Configuration for the browser tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Persistent browser profile directory. Logins made in interactive mode
    /// are kept here between runs (default: <data dir>/quarry/browser_session)
    pub profile_dir: Option<PathBuf>,

    /// Chrome/Chromium executable; detected automatically when unset
    pub chrome_executable: Option<PathBuf>,

    /// Page navigation timeout in seconds (default: 45)
    pub navigation_timeout_secs: u64,

    /// Wait after navigation for in-page viewers to load, unattended runs only
    /// (default: 3000)
    pub wait_after_load_ms: u64,

    /// Upper bound on waiting for in-flight browser downloads (default: 60)
    pub download_wait_secs: u64,

    /// Extra command-line switches for the browser
    pub args: Vec<String>,

    /// Selectors tried in order when nothing was captured; the first element
    /// that yields a link wins
    pub link_selectors: Vec<LinkSelector>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            profile_dir: None,
            chrome_executable: None,
            navigation_timeout_secs: 45,
            wait_after_load_ms: 3000,
            download_wait_secs: 60,
            args: vec![
                // Keeps navigator.webdriver unset so fewer sites bounce us
                "--disable-blink-features=AutomationControlled".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            link_selectors: LinkSelector::defaults(),
        }
    }
}

impl ScraperConfig {
    /// Get the navigation timeout as a Duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }

    /// Get the download drain ceiling as a Duration
    pub fn download_wait(&self) -> Duration {
        Duration::from_secs(self.download_wait_secs)
    }

    /// Profile directory to use, falling back to the per-user data directory.
    pub fn resolved_profile_dir(&self) -> Option<PathBuf> {
        self.profile_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("quarry").join("browser_session")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = ScraperConfig::default();
        assert!(config.profile_dir.is_none());
        assert_eq!(config.navigation_timeout_secs, 45);
        assert_eq!(config.download_wait_secs, 60);
        assert!(config
            .args
            .iter()
            .any(|a| a == "--disable-blink-features=AutomationControlled"));
        assert_eq!(config.link_selectors.len(), 6);
    }

    #[test]
    fn test_durations() {
        let config = ScraperConfig::default();
        assert_eq!(config.navigation_timeout(), Duration::from_secs(45));
        assert_eq!(config.wait_after_load(), Duration::from_millis(3000));
        assert_eq!(config.download_wait(), Duration::from_secs(60));
    }

    #[test]
    fn test_explicit_profile_dir_wins() {
        let config = ScraperConfig {
            profile_dir: Some(PathBuf::from("/tmp/profile")),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_profile_dir(),
            Some(PathBuf::from("/tmp/profile"))
        );
    }
}
