//! Configuration management for quarry.
//!
//! Configuration is read from `~/.config/quarry/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.
//! Command-line flags override file values.

use crate::fetcher::FetchConfig;
use crate::scraper::ScraperConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub fetch: FetchConfig,
    pub browser: ScraperConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            // Create default config with comments
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/quarry/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("quarry").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# quarry configuration

[fetch]
# Where documents are saved
output_dir = "downloads"

# Pause in the browser tier so you can sign in or solve captchas
interactive = false

# Direct download connect/idle timeout in seconds; a body that keeps
# arriving is never cut off
direct_timeout_secs = 15

# A direct download only counts if the server declares this content type
content_type = "application/pdf"

# Extension given to saved documents
extension = "pdf"

# Hosts that block or hang plain HTTP clients; their direct links go
# straight to the browser tier
skip_domains = [
    "onlinelibrary.wiley.com",
    "sciencedirect.com",
    "linkinghub.elsevier.com",
    "link.springer.com",
    "nature.com",
    "pnas.org",
    "academic.oup.com",
    "journals.ametsoc.org",
]

[browser]
# Persistent profile so sign-ins survive between runs
# (default: <data dir>/quarry/browser_session)
# profile_dir = "/home/me/.local/share/quarry/browser_session"

# Chrome/Chromium binary, detected automatically when unset
# chrome_executable = "/usr/bin/chromium"

# Page navigation timeout in seconds
navigation_timeout_secs = 45

# Wait after navigation in unattended runs (milliseconds)
wait_after_load_ms = 3000

# Upper bound on waiting for browser downloads to finish (seconds)
download_wait_secs = 60

# Extra browser switches
args = [
    "--disable-blink-features=AutomationControlled",
    "--disable-dev-shm-usage",
]

# Tried in order when nothing was captured; the first element yielding a
# link wins. `css` matches a CSS selector, `tag` + `text` matches the first
# such element whose text contains `text`.
link_selectors = [
    { css = "a[href$='.pdf']" },
    { tag = "a", text = "PDF" },
    { tag = "a", text = "Download PDF" },
    { tag = "button", text = "PDF" },
    { css = "i.fa-file-pdf" },
    { css = ".pdf-link" },
]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
