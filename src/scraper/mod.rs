//! Browser tier for documents behind landing pages.
//!
//! Used when the direct link is missing, skip-listed, or refused. A
//! persistent browser profile keeps sign-ins between runs, so sites that
//! need a login only need it once in interactive mode.
//!
//! # Flow
//!
//! ```text
//! launch → arm observers → navigate → wait (operator / downloads)
//!        → evaluate captures → link search fallback → close
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use quarry::scraper::{ChromeFetcher, ConsoleOperator, InteractiveFetch, ScraperConfig};
//!
//! let fetcher = ChromeFetcher::new(config, profile_dir, &fetch_config, direct, Arc::new(ConsoleOperator::stdin()));
//! let outcome = fetcher.try_fetch("https://doi.org/10.1175/BAMS-D-11-00228.1", dir, "Rainfall Atlas", true).await;
//! ```

mod chrome;
mod config;
mod extractor;
mod operator;
mod session;

pub use chrome::ChromeFetcher;
pub use config::ScraperConfig;
pub use extractor::{LinkFinder, LinkSelector, SearchHits};
pub use operator::{ConsoleOperator, LineOperator, Operator};
pub use session::SessionContext;

use std::path::Path;

use async_trait::async_trait;

use crate::fetcher::TierOutcome;

/// Expensive tier: open the landing page in a browser and catch the
/// document however the site delivers it.
#[async_trait]
pub trait InteractiveFetch: Send + Sync {
    /// `interactive` pauses for the operator before the session is evaluated.
    async fn try_fetch(
        &self,
        landing_url: &str,
        dir: &Path,
        base_name: &str,
        interactive: bool,
    ) -> TierOutcome;
}
