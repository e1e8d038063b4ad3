//! Browser session controller.
//!
//! A [`ScrapeSession`] owns one renderer and one page context and walks them
//! through `Uninitialized → Ready → (Navigating → Ready)* → Closed`. Every
//! error from the browser seam stops here: the public operations report
//! `bool` or an empty result and log the cause.

use crate::readiness::{wait_for_challenge_clearance, wait_for_job_links, WaitBudget};
use crate::renderer::{LaunchOptions, Launcher, RenderContext, Renderer};
use anyhow::{Context, Result};
use chrono::Utc;
use jobscout::{extract_jobs, finalize, site_domain, DelayRange, JobRecord, StoredCookie};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// Desktop Chrome user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Screenshot written when navigation fails.
pub const NAVIGATION_FAILED_CAPTURE: &str = "debug_navigation_failed.png";

/// Screenshot written when a page yields no listings.
pub const NO_JOBS_CAPTURE: &str = "debug_no_jobs.png";

/// Lifecycle of a [`ScrapeSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Navigating,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Ready => "ready",
            SessionState::Navigating => "navigating",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Knobs for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    /// Load cookies from `cookie_file` on init and write them back on shutdown.
    pub use_cookies: bool,
    pub user_agent: String,
    pub cookie_file: PathBuf,
    /// Where diagnostic screenshots go.
    pub diagnostics_dir: PathBuf,
    pub navigation_timeout: Duration,
    pub challenge_budget: WaitBudget,
    pub selector_budget: WaitBudget,
    /// Pauses applied, in order, after the page is ready.
    pub settle_delays: Vec<DelayRange>,
    /// Domain the page must land on to count as past a challenge. Derived
    /// from the navigation URL when `None`.
    pub target_domain: Option<String>,
    pub extra_args: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: false,
            use_cookies: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cookie_file: PathBuf::from("cookies.json"),
            diagnostics_dir: PathBuf::from("."),
            navigation_timeout: Duration::from_secs(120),
            challenge_budget: WaitBudget::attempts(10, DelayRange::new(2000, 4000)),
            selector_budget: WaitBudget::deadline(
                Duration::from_secs(90),
                Duration::from_millis(500),
            ),
            settle_delays: vec![DelayRange::new(3000, 5000), DelayRange::new(1000, 2000)],
            target_domain: None,
            extra_args: Vec::new(),
        }
    }
}

impl SessionConfig {
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            headless: self.headless,
            extra_args: self.extra_args.clone(),
        }
    }

    fn capture_path(&self, name: &str) -> PathBuf {
        self.diagnostics_dir.join(name)
    }
}

/// One browser, one page, one sequence of scrapes.
pub struct ScrapeSession {
    config: SessionConfig,
    launcher: Arc<dyn Launcher>,
    renderer: Option<Box<dyn Renderer>>,
    context: Option<Box<dyn RenderContext>>,
    state: SessionState,
}

impl ScrapeSession {
    pub fn new(config: SessionConfig, launcher: Arc<dyn Launcher>) -> Self {
        Self {
            config,
            launcher,
            renderer: None,
            context: None,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Launch the browser and prepare the page.
    ///
    /// Returns `true` once the session is Ready. A Ready session is left
    /// alone; a Closed one cannot be reopened.
    pub async fn init(&mut self) -> bool {
        match self.state {
            SessionState::Ready => return true,
            SessionState::Closed => {
                warn!("init called on a closed session");
                return false;
            }
            SessionState::Navigating => {
                warn!("init called while navigating");
                return false;
            }
            SessionState::Uninitialized => {}
        }

        info!(headless = self.config.headless, "launching browser");
        match self.try_init().await {
            Ok(()) => {
                self.state = SessionState::Ready;
                info!("browser session ready");
                true
            }
            Err(e) => {
                error!("browser session failed to initialize: {e:#}");
                self.release().await;
                false
            }
        }
    }

    async fn try_init(&mut self) -> Result<()> {
        let renderer = self
            .launcher
            .launch(&self.config.launch_options())
            .await
            .context("launching browser")?;
        let renderer = self.renderer.insert(renderer);
        let context = renderer.new_context().await.context("opening page")?;
        let context = self.context.insert(context);

        if self.config.use_cookies {
            let cookies = jobscout::load_cookies(&self.config.cookie_file);
            if !cookies.is_empty() {
                if let Err(e) = context.set_cookies(&cookies).await {
                    warn!("could not apply saved cookies: {e:#}");
                }
            }
        }

        context
            .set_user_agent(&self.config.user_agent)
            .await
            .context("setting user agent")?;
        Ok(())
    }

    /// Add cookies to the live page. Returns `false` when there is no page or
    /// the browser rejects them.
    pub async fn apply_cookies(&mut self, cookies: &[StoredCookie]) -> bool {
        if cookies.is_empty() {
            return true;
        }
        let Some(context) = self.context.as_ref() else {
            warn!("cannot apply cookies: session is {}", self.state);
            return false;
        };
        match context.set_cookies(cookies).await {
            Ok(()) => {
                debug!("applied {} cookie(s)", cookies.len());
                true
            }
            Err(e) => {
                warn!("could not apply cookies: {e:#}");
                false
            }
        }
    }

    /// Load `url` and wait for it to settle.
    ///
    /// Readiness waits that run out are logged and ignored; only a failed
    /// navigation returns `false`. The session stays usable either way.
    pub async fn navigate_to_upwork(&mut self, url: &str) -> bool {
        if self.state != SessionState::Ready {
            warn!("cannot navigate: session is {}", self.state);
            return false;
        }

        self.state = SessionState::Navigating;
        info!("navigating to {url}");
        let result = self.try_navigate(url).await;
        self.state = SessionState::Ready;

        match result {
            Ok(()) => true,
            Err(e) => {
                error!("navigation to {url} failed: {e:#}");
                self.capture(NAVIGATION_FAILED_CAPTURE).await;
                false
            }
        }
    }

    async fn try_navigate(&mut self, url: &str) -> Result<()> {
        let target_domain = match &self.config.target_domain {
            Some(domain) => domain.clone(),
            None => site_domain(url).context("resolving target domain")?,
        };
        let context = self
            .context
            .as_mut()
            .context("session has no page context")?;

        let timeout_ms = self.config.navigation_timeout.as_millis() as u64;
        let nav = context.navigate(url, timeout_ms).await?;
        debug!(final_url = %nav.final_url, load_time_ms = nav.load_time_ms, "page loaded");

        let context: &dyn RenderContext = &**context;
        wait_for_challenge_clearance(context, &target_domain, self.config.challenge_budget).await;
        wait_for_job_links(context, self.config.selector_budget).await;

        for delay in &self.config.settle_delays {
            tokio::time::sleep(delay.sample()).await;
        }
        Ok(())
    }

    /// Extract up to `max_jobs` listings from the current page.
    pub async fn scrape_jobs(&mut self, max_jobs: usize) -> Vec<JobRecord> {
        if self.state != SessionState::Ready {
            warn!("cannot scrape: session is {}", self.state);
            return Vec::new();
        }

        let (html, page_url) = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("could not snapshot page: {e:#}");
                return Vec::new();
            }
        };

        let records = finalize(extract_jobs(&html, &page_url, max_jobs), Utc::now());
        if records.is_empty() {
            warn!("no job listings found on {page_url}");
            self.capture(NO_JOBS_CAPTURE).await;
        } else {
            info!("extracted {} job listing(s)", records.len());
        }
        records
    }

    async fn snapshot(&self) -> Result<(String, String)> {
        let context = self.context.as_ref().context("session has no page context")?;
        let html = context.get_html().await?;
        let url = context.get_url().await?;
        Ok((html, url))
    }

    /// Write the browser's cookie jar to the cookie file.
    pub async fn save_cookies(&self) -> bool {
        let Some(context) = self.context.as_ref() else {
            debug!("no page context, skipping cookie save");
            return false;
        };
        let cookies = match context.get_cookies().await {
            Ok(cookies) => cookies,
            Err(e) => {
                warn!("could not read cookies from browser: {e:#}");
                return false;
            }
        };
        match jobscout::save_cookies(&self.config.cookie_file, &cookies) {
            Ok(()) => {
                info!(
                    "saved {} cookie(s) to {}",
                    cookies.len(),
                    self.config.cookie_file.display()
                );
                true
            }
            Err(e) => {
                warn!(
                    "could not write cookie file {}: {e}",
                    self.config.cookie_file.display()
                );
                false
            }
        }
    }

    /// Release the page and the browser. Safe to call more than once.
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.release().await;
        self.state = SessionState::Closed;
        info!("browser session closed");
    }

    async fn release(&mut self) {
        if let Some(context) = self.context.take() {
            if let Err(e) = context.close().await {
                debug!("error closing page: {e:#}");
            }
        }
        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.shutdown().await {
                warn!("error shutting down browser: {e:#}");
            }
        }
    }

    async fn capture(&self, name: &str) {
        let Some(context) = self.context.as_ref() else {
            return;
        };
        let path = self.config.capture_path(name);
        match write_capture(&**context, &path).await {
            Ok(()) => info!("diagnostic screenshot saved to {}", path.display()),
            Err(e) => warn!("could not save diagnostic screenshot {}: {e:#}", path.display()),
        }
    }
}

async fn write_capture(context: &dyn RenderContext, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    context.screenshot(path).await
}

/// A session shared by every request, one request at a time.
pub struct SharedSession {
    inner: Mutex<ScrapeSession>,
    ready: AtomicBool,
}

impl SharedSession {
    pub fn new(session: ScrapeSession) -> Self {
        Self {
            inner: Mutex::new(session),
            ready: AtomicBool::new(false),
        }
    }

    pub async fn init(&self) -> bool {
        let ok = self.inner.lock().await.init().await;
        self.ready.store(ok, Ordering::SeqCst);
        ok
    }

    /// Whether the session finished initializing. Does not wait on the lock.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Exclusive access for one scrape.
    pub async fn lock(&self) -> MutexGuard<'_, ScrapeSession> {
        self.inner.lock().await
    }

    /// Save cookies (when enabled) and close the browser.
    pub async fn shutdown(&self) {
        self.ready.store(false, Ordering::SeqCst);
        let mut session = self.inner.lock().await;
        if session.config().use_cookies && session.is_ready() {
            session.save_cookies().await;
        }
        session.close().await;
    }
}
