//! # Quarry
//!
//! Fetches the documents behind a catalog of paper references.
//!
//! ## Architecture
//!
//! Each reference goes through an escalating chain of tiers:
//!
//! ```text
//! Catalog → already present? → direct HTTP → browser session → outcome
//! ```
//!
//! - [`catalog`]: parses the `Title:` / `Main Link:` / `[PDF]:` results file
//! - [`fetcher`]: collision-free naming, the direct tier and the orchestrator
//! - [`scraper`]: the browser tier, driven over CDP with chromiumoxide
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch everything listed in a catalog
//! quarry fetch scholar_results.txt -o papers
//!
//! # Same, pausing in the browser to sign in where needed
//! quarry fetch scholar_results.txt --interactive
//!
//! # Plain bulk download of a URL list
//! quarry download urls.txt -o data
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires config, catalog parser
/// and the fetch tiers together.
pub mod app;

/// Reference catalog parsing.
pub mod catalog;

/// Command-line interface using clap.
///
/// - `fetch <catalog>` - Fetch every paper in a catalog
/// - `download <list>` - Download every URL in a list
/// - `parse <catalog>` - Show parsed references
pub mod cli;

/// Configuration loaded from `~/.config/quarry/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Reference`](domain::Reference): one catalog record
/// - [`FetchOutcome`](domain::FetchOutcome): what happened to it
pub mod domain;

/// Direct downloads and tier orchestration.
///
/// - [`FilenameAllocator`](fetcher::FilenameAllocator): non-clobbering names
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based direct tier
/// - [`TieredFetcher`](fetcher::TieredFetcher): per-reference escalation
pub mod fetcher;

/// Browser tier using chromiumoxide.
///
/// - [`ChromeFetcher`](scraper::ChromeFetcher): CDP-driven browser session
/// - [`SessionContext`](scraper::SessionContext): per-visit capture state
/// - [`InteractiveFetch`](scraper::InteractiveFetch): async trait for the tier
pub mod scraper;
