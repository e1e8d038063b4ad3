//! Scripted browser used by the integration tests.
//!
//! `FakeBrowser` records what the session asks of it and answers from a
//! script: fixed HTML, a sequence of page titles, and switches that make
//! launch or navigation fail.

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use jobscout::{DelayRange, StoredCookie};
use jobscout_runtime::readiness::WaitBudget;
use jobscout_runtime::renderer::{
    LaunchOptions, Launcher, NavigationResult, RenderContext, Renderer,
};
use jobscout_runtime::session::SessionConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const SEARCH_URL: &str = "https://www.upwork.com/nx/search/jobs/?q=rust";

#[derive(Debug, Default)]
pub struct Script {
    pub html: String,
    /// Titles returned in order; the last one repeats.
    pub titles: Vec<String>,
    pub url: String,
    pub fail_launch: bool,
    pub fail_navigation: bool,
    pub fail_user_agent: bool,

    pub launches: usize,
    pub navigations: Vec<String>,
    pub title_reads: usize,
    pub screenshots: Vec<PathBuf>,
    pub contexts_closed: usize,
    pub shutdowns: usize,
    pub cookies_set: Vec<StoredCookie>,
    pub jar: Vec<StoredCookie>,
    pub user_agent: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub script: Arc<Mutex<Script>>,
}

impl FakeBrowser {
    pub fn with_html(html: impl Into<String>) -> Self {
        let browser = Self::default();
        {
            let mut s = browser.script.lock().unwrap();
            s.html = html.into();
            s.titles = vec!["Rust Jobs | Upwork".to_string()];
        }
        browser
    }

    pub fn failing_launch() -> Self {
        let browser = Self::with_html("");
        browser.script.lock().unwrap().fail_launch = true;
        browser
    }

    pub fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn launcher(&self) -> Arc<dyn Launcher> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Launcher for FakeBrowser {
    async fn launch(&self, _options: &LaunchOptions) -> Result<Box<dyn Renderer>> {
        let mut s = self.script.lock().unwrap();
        s.launches += 1;
        if s.fail_launch {
            bail!("no browser in tests");
        }
        Ok(Box::new(FakeRenderer {
            script: Arc::clone(&self.script),
        }))
    }
}

struct FakeRenderer {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        Ok(Box::new(FakeContext {
            script: Arc::clone(&self.script),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        self.script.lock().unwrap().shutdowns += 1;
        Ok(())
    }
}

struct FakeContext {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl RenderContext for FakeContext {
    async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
        let mut s = self.script.lock().unwrap();
        s.navigations.push(url.to_string());
        if s.fail_navigation {
            bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        s.url = url.to_string();
        Ok(NavigationResult {
            final_url: url.to_string(),
            load_time_ms: 1,
        })
    }

    async fn execute_js(&self, _script: &str) -> Result<serde_json::Value> {
        let s = self.script.lock().unwrap();
        Ok(serde_json::Value::Bool(s.html.contains("/jobs/~")))
    }

    async fn get_html(&self) -> Result<String> {
        Ok(self.script.lock().unwrap().html.clone())
    }

    async fn get_url(&self) -> Result<String> {
        Ok(self.script.lock().unwrap().url.clone())
    }

    async fn get_title(&self) -> Result<String> {
        let mut s = self.script.lock().unwrap();
        let index = s.title_reads.min(s.titles.len().saturating_sub(1));
        s.title_reads += 1;
        Ok(s.titles.get(index).cloned().unwrap_or_default())
    }

    async fn set_user_agent(&self, user_agent: &str) -> Result<()> {
        let mut s = self.script.lock().unwrap();
        if s.fail_user_agent {
            bail!("Network.setUserAgentOverride failed");
        }
        s.user_agent = Some(user_agent.to_string());
        Ok(())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        let mut s = self.script.lock().unwrap();
        s.cookies_set.extend_from_slice(cookies);
        s.jar.extend_from_slice(cookies);
        Ok(())
    }

    async fn get_cookies(&self) -> Result<Vec<StoredCookie>> {
        Ok(self.script.lock().unwrap().jar.clone())
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        std::fs::write(path, b"\x89PNG")?;
        self.script.lock().unwrap().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.script.lock().unwrap().contexts_closed += 1;
        Ok(())
    }
}

/// Session settings with no waiting and files under `dir`.
pub fn quick_config(dir: &Path) -> SessionConfig {
    SessionConfig {
        headless: true,
        use_cookies: false,
        cookie_file: dir.join("cookies.json"),
        diagnostics_dir: dir.to_path_buf(),
        challenge_budget: WaitBudget::attempts(3, DelayRange::none()),
        selector_budget: WaitBudget::attempts(2, DelayRange::none()),
        settle_delays: vec![DelayRange::none()],
        ..SessionConfig::default()
    }
}

/// A search page with one tile per slug.
pub fn search_page(slugs: &[&str]) -> String {
    let tiles: String = slugs
        .iter()
        .map(|slug| {
            format!(
                r#"<article data-test="JobTile">
                     <h2><a href="/jobs/~{slug}">Rust job {slug}</a></h2>
                     <p data-test="job-description-text">Build a crawler</p>
                     <ul><li>Hourly: $30-$60</li><li>Expert</li></ul>
                   </article>"#
            )
        })
        .collect();
    format!("<html><head><title>Rust Jobs | Upwork</title></head><body>{tiles}</body></html>")
}
