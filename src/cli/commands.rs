use std::path::Path;
use std::sync::Arc;

use crate::app::{AppContext, QuarryError, Result};
use crate::domain::{FetchOutcome, OutcomeStatus, RunSummary};
use crate::fetcher::{HttpFetcher, TierOutcome};
use crate::scraper::ConsoleOperator;

/// Run the tiered fetcher over every reference in a catalog.
pub async fn fetch(ctx: &AppContext, catalog: &Path, report: Option<&Path>) -> Result<()> {
    let references = ctx.catalog.parse_file(catalog)?;
    let output_dir = ctx.ensure_output_dir()?;

    println!(
        "Found {} papers in {}, saving to {}",
        references.len(),
        catalog.display(),
        output_dir.display()
    );
    if references.is_empty() {
        return Ok(());
    }

    let fetcher = ctx.tiered_fetcher(Arc::new(ConsoleOperator::stdin()))?;
    let total = references.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, reference) in references.iter().enumerate() {
        println!("\n[{}/{}] {}", index + 1, total, reference.display_title(index));
        let outcome = fetcher.fetch_one(index, reference).await;
        print_outcome(&outcome);
        outcomes.push(outcome);
    }

    let summary = RunSummary::from_outcomes(&outcomes);
    println!(
        "\nRun complete: {} saved, {} already present, {} failed",
        summary.saved, summary.already_present, summary.failed
    );

    if let Some(path) = report {
        write_report(path, &outcomes)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_outcome(outcome: &FetchOutcome) {
    match outcome.status {
        OutcomeStatus::Saved => {
            if let Some(path) = &outcome.saved_path {
                println!("  + saved ({:?}) {}", outcome.strategy, path.display());
            }
        }
        OutcomeStatus::AlreadyPresent => {
            if let Some(path) = &outcome.saved_path {
                println!("  = already present: {}", path.display());
            }
        }
        OutcomeStatus::Failed => {
            eprintln!(
                "  ! failed: {}",
                outcome.detail.as_deref().unwrap_or("no strategy applied")
            );
        }
    }
}

/// Write outcomes as pretty-printed JSON.
pub fn write_report(path: &Path, outcomes: &[FetchOutcome]) -> Result<()> {
    let json = serde_json::to_string_pretty(outcomes)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Download every URL in a list file, keeping the servers' file names.
pub async fn download(ctx: &AppContext, list: &Path) -> Result<()> {
    if !list.is_file() {
        return Err(QuarryError::Other(format!(
            "URL list not found: {}",
            list.display()
        )));
    }
    let content = std::fs::read_to_string(list)?;
    let urls = parse_url_list(&content);
    let output_dir = ctx.ensure_output_dir()?;

    println!("Found {} URLs. Starting download...", urls.len());

    let fetcher = HttpFetcher::new(&ctx.config.fetch)?.accept_any();
    let mut saved = 0;
    let mut errors = 0;

    for url in urls {
        match fetcher.download_named(url, output_dir).await {
            TierOutcome::Saved(path) => {
                println!("  + {} -> {}", url, path.display());
                saved += 1;
            }
            TierOutcome::Failed(e) => {
                eprintln!("  ! {} - {}", url, e);
                errors += 1;
            }
        }
    }

    println!("\nDownload complete: {} saved, {} errors", saved, errors);
    Ok(())
}

/// Non-empty lines, trimmed.
fn parse_url_list(content: &str) -> Vec<&str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Print the references parsed from a catalog.
pub fn parse(ctx: &AppContext, catalog: &Path) -> Result<()> {
    let references = ctx.catalog.parse_file(catalog)?;

    if references.is_empty() {
        println!("No references");
        return Ok(());
    }

    for (index, reference) in references.iter().enumerate() {
        println!("{}. {}", index + 1, reference.display_title(index));
        println!(
            "   main: {}",
            reference.main_link.as_deref().unwrap_or("-")
        );
        println!("   pdf:  {}", reference.pdf_link.as_deref().unwrap_or("-"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Reference, Strategy};

    #[test]
    fn test_parse_url_list_skips_blank_lines() {
        let urls = parse_url_list("https://a.org/1.tif\n\n   \n  https://a.org/2.tif  \n");
        assert_eq!(urls, vec!["https://a.org/1.tif", "https://a.org/2.tif"]);
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let outcomes = vec![
            FetchOutcome::saved(
                Reference::new("A").with_pdf_link("https://a.org/a.pdf"),
                Strategy::Direct,
                dir.path().join("A.pdf"),
            ),
            FetchOutcome::failed(Reference::new("B"), Strategy::None, Some("no links".into())),
        ];

        write_report(&path, &outcomes).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["reference"]["title"], "A");
        assert_eq!(entries[0]["strategy"], "direct");
        assert_eq!(entries[1]["status"], "failed");
        assert_eq!(entries[1]["detail"], "no links");
    }

    #[tokio::test]
    async fn test_download_missing_list_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::config::Config::default();
        config.fetch.output_dir = dir.path().join("out");
        let ctx = AppContext::new(config).unwrap();

        let err = download(&ctx, &dir.path().join("urls.txt")).await.unwrap_err();
        assert!(matches!(err, QuarryError::Other(_)));
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_fetch_missing_catalog_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = crate::config::Config::default();
        config.fetch.output_dir = dir.path().join("out");
        let ctx = AppContext::new(config).unwrap();

        let err = fetch(&ctx, &dir.path().join("scholar_results.txt"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, QuarryError::Catalog(_)));
        assert!(!dir.path().join("out").exists());
    }
}
