use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFinished, EventResponseReceived, GetResponseBodyParams, RequestId,
};
use chromiumoxide::cdp::browser_protocol::target::TargetId;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::fetcher::{DirectFetch, FetchConfig, TierFailure, TierOutcome};
use crate::scraper::config::ScraperConfig;
use crate::scraper::extractor::{LinkFinder, SearchHits};
use crate::scraper::operator::Operator;
use crate::scraper::session::SessionContext;
use crate::scraper::InteractiveFetch;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Browser tier driven through chromiumoxide.
///
/// Each call launches one persistent-profile browser, watches every tab for
/// responses of the expected content type and for browser downloads, and
/// falls back to searching the landing page for a document link that the
/// direct tier can fetch.
pub struct ChromeFetcher {
    config: ScraperConfig,
    profile_dir: PathBuf,
    content_type: String,
    extension: String,
    direct: Arc<dyn DirectFetch>,
    operator: Arc<dyn Operator>,
    finder: LinkFinder,
}

impl ChromeFetcher {
    pub fn new(
        config: ScraperConfig,
        profile_dir: PathBuf,
        fetch: &FetchConfig,
        direct: Arc<dyn DirectFetch>,
        operator: Arc<dyn Operator>,
    ) -> Self {
        let finder = LinkFinder::new(config.link_selectors.clone());
        Self {
            config,
            profile_dir,
            content_type: fetch.content_type.to_lowercase(),
            extension: fetch.extension.clone(),
            direct,
            operator,
            finder,
        }
    }

    async fn launch(&self, interactive: bool) -> Result<BrowserSession, TierFailure> {
        tokio::fs::create_dir_all(&self.profile_dir).await?;

        let mut builder = BrowserConfig::builder().user_data_dir(&self.profile_dir);
        for arg in &self.config.args {
            builder = builder.arg(arg.as_str());
        }
        if interactive {
            builder = builder.with_head();
        }
        if let Some(exe) = &self.config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }

        let browser_config = builder.build().map_err(|e| {
            TierFailure::Environment(format!("Failed to build browser config: {}", e))
        })?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            TierFailure::Environment(format!(
                "Failed to launch browser: {}. Is another instance using profile {} still running?",
                e,
                self.profile_dir.display()
            ))
        })?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Drive the CDP connection
            }
        });

        Ok(BrowserSession {
            browser,
            handler_task,
            observers: Vec::new(),
            armed: HashSet::new(),
        })
    }

    /// Steps after launch. Every failure is converted to a tier outcome so
    /// the caller can always tear the session down.
    async fn drive(
        &self,
        session: &mut BrowserSession,
        ctx: &Arc<SessionContext>,
        landing_url: &str,
        dir: &Path,
        base_name: &str,
        interactive: bool,
    ) -> TierOutcome {
        if let Err(e) = session.watch_downloads(ctx).await {
            tracing::warn!("[browser] download capture unavailable: {}", e);
        }

        let page = match session.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                return TierOutcome::Failed(TierFailure::Environment(format!(
                    "Failed to open page: {}",
                    e
                )))
            }
        };
        session.arm(&page, ctx, &self.content_type).await;

        tracing::info!("[browser] navigating to {}", landing_url);
        match tokio::time::timeout(self.config.navigation_timeout(), page.goto(landing_url)).await
        {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("[browser] navigation error for {}: {}", landing_url, e),
            Err(_) => tracing::warn!(
                "[browser] navigation to {} still loading after {}s",
                landing_url,
                self.config.navigation_timeout_secs
            ),
        }

        if interactive {
            let prompt = format!(
                "\n  [Manual] Waiting for you on: {}\n  \
                 - Sign in or solve any captcha in the browser window.\n  \
                 - Clicking 'Download' or simply viewing the PDF are both captured.\n  \
                 Press Enter once the file has been captured... ",
                base_name
            );
            tokio::select! {
                confirmed = self.operator.confirm(&prompt) => {
                    if !confirmed {
                        tracing::warn!("[browser] no operator confirmation, continuing");
                    }
                }
                _ = session.keep_arming(ctx, &self.content_type) => {}
            }
        } else {
            session
                .arm_for(ctx, &self.content_type, self.config.wait_after_load())
                .await;
        }

        session
            .drain_downloads(ctx, &self.content_type, self.config.download_wait())
            .await;

        let captured = ctx.saved().await.into_iter().next();
        let outcome = settle(
            captured,
            self.find_document_link(&page),
            self.direct.as_ref(),
            dir,
            base_name,
        )
        .await;
        if !interactive && matches!(outcome, TierOutcome::Failed(TierFailure::NoCandidate)) {
            tracing::info!("[browser] nothing found; try interactive mode for this link");
        }
        outcome
    }

    /// The page URL when it already points at a document, else the first
    /// hit of the configured selectors.
    async fn find_document_link(&self, page: &Page) -> Option<String> {
        if let Ok(Some(current)) = page.url().await {
            if let Some(url) = document_url(&current, &self.extension) {
                return Some(url);
            }
        }

        let hits: SearchHits = match page.evaluate(self.finder.search_script()).await {
            Ok(result) => result.into_value().unwrap_or_default(),
            Err(e) => {
                tracing::debug!("[browser] link search failed: {}", e);
                SearchHits::default()
            }
        };
        self.finder.pick(&hits)
    }
}

/// `current` itself when the page is already showing a document.
fn document_url(current: &str, extension: &str) -> Option<String> {
    let needle = format!(".{}", extension.to_lowercase());
    current
        .to_lowercase()
        .contains(&needle)
        .then(|| current.to_string())
}

/// A capture wins; otherwise the located link, if any, goes to the direct
/// tier. `candidate` is only awaited when nothing was captured.
async fn settle(
    captured: Option<PathBuf>,
    candidate: impl Future<Output = Option<String>>,
    direct: &dyn DirectFetch,
    dir: &Path,
    base_name: &str,
) -> TierOutcome {
    if let Some(path) = captured {
        return TierOutcome::Saved(path);
    }

    match candidate.await {
        Some(url) => {
            tracing::info!("[browser] found document link {}", url);
            direct.try_fetch(&url, dir, base_name).await
        }
        None => TierOutcome::Failed(TierFailure::NoCandidate),
    }
}

#[async_trait]
impl InteractiveFetch for ChromeFetcher {
    async fn try_fetch(
        &self,
        landing_url: &str,
        dir: &Path,
        base_name: &str,
        interactive: bool,
    ) -> TierOutcome {
        tracing::info!("[browser] using browser for {}", landing_url);

        let staging = dir.join(format!(".quarry-downloads-{}", std::process::id()));
        if let Err(e) = tokio::fs::create_dir_all(&staging).await {
            return TierOutcome::Failed(TierFailure::Write(e));
        }

        let mut session = match self.launch(interactive).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("[browser] {}", e);
                let _ = tokio::fs::remove_dir_all(&staging).await;
                return TierOutcome::Failed(e);
            }
        };

        let ctx = Arc::new(SessionContext::new(
            dir,
            &staging,
            base_name,
            self.extension.clone(),
        ));

        let outcome = self
            .drive(&mut session, &ctx, landing_url, dir, base_name, interactive)
            .await;

        session.close().await;
        let _ = tokio::fs::remove_dir_all(&staging).await;

        match &outcome {
            TierOutcome::Saved(path) => tracing::info!("[browser] saved {}", path.display()),
            TierOutcome::Failed(e) => tracing::warn!("[browser] {} failed: {}", landing_url, e),
        }
        outcome
    }
}

/// One running browser plus the observer tasks attached to it.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    observers: Vec<JoinHandle<()>>,
    armed: HashSet<TargetId>,
}

impl BrowserSession {
    /// Route browser downloads into the staging directory and watch them.
    async fn watch_downloads(&mut self, ctx: &Arc<SessionContext>) -> Result<(), TierFailure> {
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::AllowAndName)
            .download_path(ctx.staging_dir().to_string_lossy().to_string())
            .events_enabled(true)
            .build()
            .map_err(TierFailure::Environment)?;
        self.browser
            .execute(params)
            .await
            .map_err(|e| TierFailure::Environment(e.to_string()))?;

        let begins = self
            .browser
            .event_listener::<EventDownloadWillBegin>()
            .await
            .map_err(|e| TierFailure::Environment(e.to_string()))?;
        let progress = self
            .browser
            .event_listener::<EventDownloadProgress>()
            .await
            .map_err(|e| TierFailure::Environment(e.to_string()))?;

        self.observers
            .push(tokio::spawn(observe_downloads(begins, progress, ctx.clone())));
        Ok(())
    }

    /// Attach a response observer to `page` unless it already has one.
    async fn arm(&mut self, page: &Page, ctx: &Arc<SessionContext>, content_type: &str) {
        if !self.armed.insert(page.target_id().clone()) {
            return;
        }

        if let Err(e) = page.execute(EnableParams::default()).await {
            tracing::debug!("[browser] failed to enable network events: {}", e);
        }
        let responses = page.event_listener::<EventResponseReceived>().await;
        let finished = page.event_listener::<EventLoadingFinished>().await;
        match (responses, finished) {
            (Ok(responses), Ok(finished)) => {
                self.observers.push(tokio::spawn(observe_responses(
                    page.clone(),
                    responses,
                    finished,
                    ctx.clone(),
                    content_type.to_string(),
                )));
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("[browser] failed to watch responses on a tab: {}", e);
            }
        }
    }

    /// Arm tabs the session opened since the last pass.
    async fn arm_new_pages(&mut self, ctx: &Arc<SessionContext>, content_type: &str) {
        match self.browser.pages().await {
            Ok(pages) => {
                for page in pages {
                    self.arm(&page, ctx, content_type).await;
                }
            }
            Err(e) => tracing::debug!("[browser] failed to list tabs: {}", e),
        }
    }

    async fn keep_arming(&mut self, ctx: &Arc<SessionContext>, content_type: &str) {
        loop {
            self.arm_new_pages(ctx, content_type).await;
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn arm_for(&mut self, ctx: &Arc<SessionContext>, content_type: &str, period: Duration) {
        let _ = tokio::time::timeout(period, self.keep_arming(ctx, content_type)).await;
    }

    /// Wait for in-flight downloads, bounded by `ceiling`.
    async fn drain_downloads(
        &mut self,
        ctx: &Arc<SessionContext>,
        content_type: &str,
        ceiling: Duration,
    ) {
        let pending = ctx.in_flight().await;
        if pending == 0 {
            return;
        }
        tracing::info!("[browser] finishing {} active download(s)", pending);

        let start = Instant::now();
        while ctx.in_flight().await > 0 && start.elapsed() < ceiling {
            self.arm_new_pages(ctx, content_type).await;
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        let left = ctx.in_flight().await;
        if left > 0 {
            tracing::warn!("[browser] {} download(s) still running after {:?}", left, ceiling);
        }
    }

    /// Stop observers and shut the browser down.
    async fn close(mut self) {
        for observer in self.observers.drain(..) {
            observer.abort();
        }
        if let Err(e) = self.browser.close().await {
            tracing::debug!("[browser] close failed: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            tracing::debug!("[browser] wait failed: {}", e);
        }
        self.handler_task.abort();
    }
}

/// Save bodies of responses with the expected content type once they have
/// finished loading.
async fn observe_responses(
    page: Page,
    mut responses: EventStream<EventResponseReceived>,
    mut finished: EventStream<EventLoadingFinished>,
    ctx: Arc<SessionContext>,
    content_type: String,
) {
    let mut pending: HashMap<RequestId, String> = HashMap::new();

    loop {
        tokio::select! {
            biased;
            Some(event) = responses.next() => {
                let mime = event.response.mime_type.to_lowercase();
                if mime.contains(&content_type) && !ctx.is_captured(&event.response.url).await {
                    tracing::debug!("[browser] document response {}", event.response.url);
                    pending.insert(event.request_id.clone(), event.response.url.clone());
                }
            }
            Some(event) = finished.next() => {
                let Some(url) = pending.remove(&event.request_id) else {
                    continue;
                };
                let body = match page
                    .execute(GetResponseBodyParams::new(event.request_id.clone()))
                    .await
                {
                    Ok(response) => response.result,
                    Err(e) => {
                        tracing::debug!("[browser] body unavailable for {}: {}", url, e);
                        continue;
                    }
                };
                let bytes = if body.base64_encoded {
                    match base64::engine::general_purpose::STANDARD.decode(body.body.as_bytes()) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            tracing::debug!("[browser] bad body encoding for {}: {}", url, e);
                            continue;
                        }
                    }
                } else {
                    body.body.into_bytes()
                };
                match ctx.save_capture(&url, &bytes).await {
                    Ok(Some(path)) => tracing::info!("[browser] captured {} -> {}", url, path.display()),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("[browser] failed to save capture of {}: {}", url, e),
                }
            }
            else => break,
        }
    }
}

/// Track browser-initiated downloads and move them out of staging when done.
async fn observe_downloads(
    mut begins: EventStream<EventDownloadWillBegin>,
    mut progress: EventStream<EventDownloadProgress>,
    ctx: Arc<SessionContext>,
) {
    loop {
        tokio::select! {
            biased;
            Some(event) = begins.next() => {
                tracing::info!("[browser] download started: {}", event.suggested_filename);
                ctx.begin_download(&event.guid, &event.suggested_filename).await;
            }
            Some(event) = progress.next() => match event.state {
                DownloadProgressState::Completed => match ctx.complete_download(&event.guid).await {
                    Ok(Some(path)) => tracing::info!("[browser] saved download {}", path.display()),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("[browser] failed to keep download: {}", e),
                },
                DownloadProgressState::Canceled => {
                    tracing::warn!("[browser] download canceled");
                    ctx.cancel_download(&event.guid).await;
                }
                _ => {}
            },
            else => break,
        }
    }
}
