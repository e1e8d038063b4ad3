//! One-shot scrape from the command line.

use crate::cli::serve::detect_launcher;
use crate::config::{session_config, BrowserArgs};
use crate::rest::ScrapeResponse;
use crate::session::ScrapeSession;
use anyhow::{bail, Result};
use jobscout::DEFAULT_MAX_JOBS;

/// Launch a browser, scrape `url`, print the response JSON to stdout.
pub async fn run(url: &str, max_jobs: Option<usize>, browser: &BrowserArgs) -> Result<()> {
    let max_jobs = max_jobs.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_JOBS);
    let config = session_config(browser);
    let save = config.use_cookies;
    let mut session = ScrapeSession::new(config, detect_launcher());

    if !session.init().await {
        bail!("failed to initialize browser session");
    }

    let outcome = if session.navigate_to_upwork(url).await {
        let jobs = session.scrape_jobs(max_jobs).await;
        if save {
            session.save_cookies().await;
        }
        Ok(ScrapeResponse::new(url, jobs))
    } else {
        Err(anyhow::anyhow!("failed to navigate to {url}"))
    };
    session.close().await;

    let response = outcome?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
