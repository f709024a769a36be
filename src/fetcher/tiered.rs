use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::domain::{FetchOutcome, Reference, Strategy};
use crate::fetcher::filename::sanitize;
use crate::fetcher::{DirectFetch, TierOutcome};
use crate::scraper::InteractiveFetch;

/// Hosts known to block or hang plain HTTP clients. Matched as substrings of
/// the link's host.
pub const DEFAULT_SKIP_DOMAINS: &[&str] = &[
    "onlinelibrary.wiley.com",
    "sciencedirect.com",
    "linkinghub.elsevier.com",
    "link.springer.com",
    "nature.com",
    "pnas.org",
    "academic.oup.com",
    "journals.ametsoc.org",
];

#[derive(Debug, Clone)]
pub struct SkipPolicy {
    domains: Vec<String>,
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_SKIP_DOMAINS.iter().map(|d| d.to_string()))
    }
}

impl SkipPolicy {
    pub fn new(domains: impl IntoIterator<Item = String>) -> Self {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether the direct tier should be bypassed for `url`. Links without a
    /// host are never worth a direct attempt.
    pub fn should_skip(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return true;
        };
        self.domains.iter().any(|d| host.contains(d.as_str()))
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }
}

/// Run-wide settings for [`TieredFetcher`].
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Pause for the operator during the browser tier
    pub interactive: bool,
    pub skip_domains: SkipPolicy,
    /// Browser profile kept between runs so logins survive
    pub session_profile_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Extension of the expected document, without the dot
    pub extension: String,
}

/// Walks each reference through the direct tier, then the browser tier,
/// stopping at the first one that saves a file.
pub struct TieredFetcher {
    policy: FetchPolicy,
    direct: Arc<dyn DirectFetch>,
    interactive: Arc<dyn InteractiveFetch>,
}

impl TieredFetcher {
    pub fn new(
        policy: FetchPolicy,
        direct: Arc<dyn DirectFetch>,
        interactive: Arc<dyn InteractiveFetch>,
    ) -> Self {
        Self {
            policy,
            direct,
            interactive,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.policy.output_dir
    }

    /// Fetch every reference in catalog order. One reference failing never
    /// stops the batch.
    pub async fn run(&self, references: &[Reference]) -> Vec<FetchOutcome> {
        let mut outcomes = Vec::with_capacity(references.len());
        for (index, reference) in references.iter().enumerate() {
            outcomes.push(self.fetch_one(index, reference).await);
        }
        outcomes
    }

    /// Base filename (without extension) used for a reference's document.
    pub fn base_name(&self, index: usize, reference: &Reference) -> String {
        let name = sanitize(&reference.display_title(index));
        if name.trim().is_empty() {
            format!("paper_{}", index)
        } else {
            name
        }
    }

    pub async fn fetch_one(&self, index: usize, reference: &Reference) -> FetchOutcome {
        let dir = self.policy.output_dir.as_path();
        let base = self.base_name(index, reference);

        let existing = dir.join(format!("{}.{}", base, self.policy.extension));
        if existing.exists() {
            tracing::info!("{} already present, skipping", existing.display());
            return FetchOutcome::already_present(reference.clone(), existing);
        }

        let mut strategy = Strategy::None;
        let mut detail = None;

        if let Some(pdf_link) = &reference.pdf_link {
            if self.policy.skip_domains.should_skip(pdf_link) {
                tracing::info!("[direct] skipped, difficult domain: {}", pdf_link);
            } else {
                strategy = Strategy::Direct;
                match self.direct.try_fetch(pdf_link, dir, &base).await {
                    TierOutcome::Saved(path) => {
                        return FetchOutcome::saved(reference.clone(), Strategy::Direct, path);
                    }
                    TierOutcome::Failed(e) => detail = Some(e.to_string()),
                }
            }
        }

        if let Some(main_link) = &reference.main_link {
            strategy = Strategy::Interactive;
            match self
                .interactive
                .try_fetch(main_link, dir, &base, self.policy.interactive)
                .await
            {
                TierOutcome::Saved(path) => {
                    return FetchOutcome::saved(reference.clone(), Strategy::Interactive, path);
                }
                TierOutcome::Failed(e) => detail = Some(e.to_string()),
            }
        }

        if !reference.has_links() {
            detail = Some("no links".to_string());
        }

        FetchOutcome::failed(reference.clone(), strategy, detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::domain::OutcomeStatus;
    use crate::fetcher::{FetchConfig, HttpFetcher, TierFailure};

    /// Records calls and saves a file for URLs listed in `working`.
    #[derive(Default)]
    struct MockTier {
        working: Vec<String>,
        calls: Mutex<Vec<String>>,
    }

    impl MockTier {
        fn working(urls: &[&str]) -> Self {
            Self {
                working: urls.iter().map(|u| u.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn attempt(&self, url: &str, dir: &Path, base_name: &str) -> TierOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            if self.working.iter().any(|w| w == url) {
                let path = dir.join(format!("{}.pdf", base_name));
                std::fs::write(&path, b"%PDF").unwrap();
                TierOutcome::Saved(path)
            } else {
                TierOutcome::Failed(TierFailure::Status(404))
            }
        }
    }

    #[async_trait]
    impl DirectFetch for MockTier {
        async fn try_fetch(&self, url: &str, dir: &Path, base_name: &str) -> TierOutcome {
            self.attempt(url, dir, base_name)
        }
    }

    #[async_trait]
    impl InteractiveFetch for MockTier {
        async fn try_fetch(
            &self,
            landing_url: &str,
            dir: &Path,
            base_name: &str,
            _interactive: bool,
        ) -> TierOutcome {
            self.attempt(landing_url, dir, base_name)
        }
    }

    fn policy(dir: &Path) -> FetchPolicy {
        FetchPolicy {
            interactive: false,
            skip_domains: SkipPolicy::default(),
            session_profile_dir: dir.join("browser_session"),
            output_dir: dir.to_path_buf(),
            extension: "pdf".to_string(),
        }
    }

    #[test]
    fn test_skip_policy_matches_host_substring() {
        let skip = SkipPolicy::default();
        assert!(skip.should_skip("https://www.sciencedirect.com/science/article/pii/S0022"));
        assert!(skip.should_skip("https://WWW.NATURE.COM/articles/s41586.pdf"));
        assert!(!skip.should_skip("https://www.mdpi.com/2073-4441/12/1/1/pdf"));
        // Path matches do not count, only the host
        assert!(!skip.should_skip("https://example.org/nature.com.pdf"));
    }

    #[test]
    fn test_skip_policy_skips_unparseable_links() {
        let skip = SkipPolicy::new(Vec::new());
        assert!(skip.should_skip("None"));
        assert!(skip.should_skip(""));
        assert!(!skip.should_skip("https://example.org/a.pdf"));
    }

    #[test]
    fn test_base_name_sanitizes_title() {
        let dir = tempfile::tempdir().unwrap();
        let tiers = Arc::new(MockTier::default());
        let fetcher = TieredFetcher::new(policy(dir.path()), tiers.clone(), tiers);

        assert_eq!(
            fetcher.base_name(0, &Reference::new("ENSO: a review?")),
            "ENSO a review"
        );
        assert_eq!(fetcher.base_name(4, &Reference::new("???")), "paper_4");
        assert_eq!(fetcher.base_name(2, &Reference::new("")), "paper_2");
    }

    #[tokio::test]
    async fn test_skip_listed_domain_never_reaches_direct_tier() {
        let dir = tempfile::tempdir().unwrap();
        let direct = Arc::new(MockTier::working(&["https://www.sciencedirect.com/a.pdf"]));
        let interactive = Arc::new(MockTier::default());
        let fetcher = TieredFetcher::new(policy(dir.path()), direct.clone(), interactive.clone());

        let reference = Reference::new("A").with_pdf_link("https://www.sciencedirect.com/a.pdf");
        let outcome = fetcher.fetch_one(0, &reference).await;

        assert!(direct.calls().is_empty());
        assert!(interactive.calls().is_empty());
        assert_eq!(outcome.status, OutcomeStatus::Failed);
    }

    #[tokio::test]
    async fn test_existing_output_is_already_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("A.pdf"), b"%PDF").unwrap();
        let direct = Arc::new(MockTier::working(&["https://example.org/a.pdf"]));
        let interactive = Arc::new(MockTier::working(&["https://example.org/a"]));
        let fetcher = TieredFetcher::new(policy(dir.path()), direct.clone(), interactive.clone());

        let reference = Reference::new("A")
            .with_pdf_link("https://example.org/a.pdf")
            .with_main_link("https://example.org/a");
        let outcome = fetcher.fetch_one(0, &reference).await;

        assert_eq!(outcome.status, OutcomeStatus::AlreadyPresent);
        assert_eq!(outcome.saved_path, Some(dir.path().join("A.pdf")));
        assert!(direct.calls().is_empty());
        assert!(interactive.calls().is_empty());
    }

    #[tokio::test]
    async fn test_direct_success_skips_browser() {
        let dir = tempfile::tempdir().unwrap();
        let direct = Arc::new(MockTier::working(&["https://example.org/a.pdf"]));
        let interactive = Arc::new(MockTier::working(&["https://example.org/a"]));
        let fetcher = TieredFetcher::new(policy(dir.path()), direct.clone(), interactive.clone());

        let reference = Reference::new("A")
            .with_pdf_link("https://example.org/a.pdf")
            .with_main_link("https://example.org/a");
        let outcome = fetcher.fetch_one(0, &reference).await;

        assert!(outcome.success());
        assert_eq!(outcome.strategy, Strategy::Direct);
        assert!(interactive.calls().is_empty());
    }

    #[tokio::test]
    async fn test_direct_failure_escalates_to_browser() {
        let dir = tempfile::tempdir().unwrap();
        let direct = Arc::new(MockTier::default());
        let interactive = Arc::new(MockTier::working(&["https://example.org/a"]));
        let fetcher = TieredFetcher::new(policy(dir.path()), direct.clone(), interactive.clone());

        let reference = Reference::new("A")
            .with_pdf_link("https://example.org/a.pdf")
            .with_main_link("https://example.org/a");
        let outcome = fetcher.fetch_one(0, &reference).await;

        assert_eq!(direct.calls(), vec!["https://example.org/a.pdf"]);
        assert_eq!(interactive.calls(), vec!["https://example.org/a"]);
        assert_eq!(outcome.strategy, Strategy::Interactive);
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_both_tiers_failing_records_last_reason() {
        let dir = tempfile::tempdir().unwrap();
        let tiers = Arc::new(MockTier::default());
        let fetcher = TieredFetcher::new(policy(dir.path()), tiers.clone(), tiers.clone());

        let reference = Reference::new("A")
            .with_pdf_link("https://example.org/a.pdf")
            .with_main_link("https://example.org/a");
        let outcome = fetcher.fetch_one(0, &reference).await;

        assert_eq!(outcome.status, OutcomeStatus::Failed);
        assert_eq!(outcome.strategy, Strategy::Interactive);
        assert_eq!(outcome.detail.as_deref(), Some("unexpected status 404"));
        assert_eq!(tiers.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_batch_of_three_does_not_abort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/working.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(b"%PDF-1.7".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let direct = Arc::new(HttpFetcher::new(&FetchConfig::default()).unwrap());
        let interactive = Arc::new(MockTier::working(&["https://www.sciencedirect.com/article/1"]));
        let fetcher = TieredFetcher::new(policy(dir.path()), direct, interactive.clone());

        let references = vec![
            Reference::new("Working direct").with_pdf_link(format!("{}/working.pdf", server.uri())),
            Reference::new("Skip listed")
                .with_pdf_link("https://www.sciencedirect.com/article/1/pdf")
                .with_main_link("https://www.sciencedirect.com/article/1"),
            Reference::new("No links"),
        ];

        let outcomes = fetcher.run(&references).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].strategy, Strategy::Direct);
        assert!(outcomes[0].success());
        assert_eq!(
            outcomes[0].saved_path,
            Some(dir.path().join("Working direct.pdf"))
        );
        assert_eq!(outcomes[1].strategy, Strategy::Interactive);
        assert!(outcomes[1].success());
        assert_eq!(outcomes[2].status, OutcomeStatus::Failed);
        assert_eq!(outcomes[2].strategy, Strategy::None);
        assert_eq!(outcomes[2].detail.as_deref(), Some("no links"));
        assert_eq!(interactive.calls(), vec!["https://www.sciencedirect.com/article/1"]);
    }
}
