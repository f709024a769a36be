use std::path::Path;
use std::sync::Arc;

use crate::app::error::{QuarryError, Result};
use crate::catalog::CatalogParser;
use crate::config::Config;
use crate::fetcher::{DirectFetch, FetchPolicy, HttpFetcher, SkipPolicy, TieredFetcher};
use crate::scraper::{ChromeFetcher, Operator};

pub struct AppContext {
    pub config: Config,
    pub catalog: CatalogParser,
    pub direct: Arc<HttpFetcher>,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let direct = Arc::new(HttpFetcher::new(&config.fetch)?);

        Ok(Self {
            config,
            catalog: CatalogParser::new(),
            direct,
        })
    }

    /// Run-wide policy for the tiered fetcher, built from the loaded config.
    pub fn policy(&self) -> Result<FetchPolicy> {
        let session_profile_dir = self
            .config
            .browser
            .resolved_profile_dir()
            .ok_or_else(|| QuarryError::Other("Could not find data directory".into()))?;

        Ok(FetchPolicy {
            interactive: self.config.fetch.interactive,
            skip_domains: SkipPolicy::new(self.config.fetch.skip_domains.iter().cloned()),
            session_profile_dir,
            output_dir: self.config.fetch.output_dir.clone(),
            extension: self.config.fetch.extension.clone(),
        })
    }

    /// Direct tier plus a Chrome-backed browser tier sharing it for link
    /// fallbacks.
    pub fn tiered_fetcher(&self, operator: Arc<dyn Operator>) -> Result<TieredFetcher> {
        let policy = self.policy()?;
        let direct: Arc<dyn DirectFetch> = self.direct.clone();
        let browser = ChromeFetcher::new(
            self.config.browser.clone(),
            policy.session_profile_dir.clone(),
            &self.config.fetch,
            direct.clone(),
            operator,
        );

        Ok(TieredFetcher::new(policy, direct, Arc::new(browser)))
    }

    /// Create the output directory before any work starts.
    pub fn ensure_output_dir(&self) -> Result<&Path> {
        let dir = self.config.fetch.output_dir.as_path();
        std::fs::create_dir_all(dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::scraper::LineOperator;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.fetch.output_dir = dir.join("papers");
        config.fetch.skip_domains = vec!["tandfonline.com".into()];
        config.browser.profile_dir = Some(dir.join("profile"));
        config
    }

    #[test]
    fn test_policy_reflects_config() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(config_in(dir.path())).unwrap();

        let policy = ctx.policy().unwrap();
        assert!(!policy.interactive);
        assert_eq!(policy.output_dir, dir.path().join("papers"));
        assert_eq!(policy.session_profile_dir, dir.path().join("profile"));
        assert_eq!(policy.skip_domains.domains(), ["tandfonline.com".to_string()]);
        assert_eq!(policy.extension, "pdf");
    }

    #[test]
    fn test_ensure_output_dir_creates_it() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(config_in(dir.path())).unwrap();

        let out = ctx.ensure_output_dir().unwrap();
        assert_eq!(out, dir.path().join("papers"));
        assert!(out.is_dir());
    }

    #[tokio::test]
    async fn test_tiered_fetcher_uses_policy() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::new(config_in(dir.path())).unwrap();
        let operator = Arc::new(LineOperator::new(tokio::io::BufReader::new(tokio::io::empty())));

        let fetcher = ctx.tiered_fetcher(operator).unwrap();
        assert_eq!(fetcher.output_dir(), dir.path().join("papers"));
    }
}
