use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, QuarryError>;
