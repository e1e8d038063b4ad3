//! Renderer abstraction for browser-based page rendering.
//!
//! Defines the `Launcher`, `Renderer`, and `RenderContext` traits that
//! abstract over the browser engine (currently Chromium via chromiumoxide).
//! The session controller only ever talks to these traits.

pub mod chromium;

use anyhow::Result;
use async_trait::async_trait;
use jobscout::StoredCookie;
use std::path::Path;

/// Result of navigating to a URL.
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// The final URL after any redirects.
    pub final_url: String,
    /// Time taken to load the page in milliseconds.
    pub load_time_ms: u64,
}

/// How to start a browser.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Extra command-line flags passed to the browser.
    pub extra_args: Vec<String>,
}

/// Something that can start a browser engine.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Launch a new browser instance.
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn Renderer>>;
}

/// A running browser engine that can create rendering contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a new browser context (tab).
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
    /// Shut down the browser engine.
    async fn shutdown(&self) -> Result<()>;
}

/// A single browser context (tab) for rendering pages.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to a URL with a timeout.
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult>;
    /// Execute JavaScript in the page context and return the result.
    async fn execute_js(&self, script: &str) -> Result<serde_json::Value>;
    /// Get the full page HTML.
    async fn get_html(&self) -> Result<String>;
    /// Get the current URL.
    async fn get_url(&self) -> Result<String>;
    /// Get the document title.
    async fn get_title(&self) -> Result<String>;
    /// Override the user agent for subsequent requests.
    async fn set_user_agent(&self, user_agent: &str) -> Result<()>;
    /// Add cookies to the browser's cookie jar.
    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<()>;
    /// Snapshot the cookie jar.
    async fn get_cookies(&self) -> Result<Vec<StoredCookie>>;
    /// Save a full-page PNG screenshot to `path`.
    async fn screenshot(&self, path: &Path) -> Result<()>;
    /// Close this context.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// A launcher used when no browser is available.
///
/// Every launch fails, so sessions built on it never leave `Uninitialized`
/// and the HTTP API answers scrape requests with 503/500.
pub struct NoopLauncher;

#[async_trait]
impl Launcher for NoopLauncher {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn Renderer>> {
        Err(anyhow::anyhow!("Browser not available"))
    }
}
