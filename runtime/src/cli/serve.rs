//! Run the HTTP API.

use crate::config::{ServeArgs, ServeConfig, SessionMode};
use crate::renderer::chromium::ChromiumLauncher;
use crate::renderer::{Launcher, NoopLauncher};
use crate::rest::{self, AppState, SessionProvider};
use crate::session::{ScrapeSession, SharedSession};
use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Chromium if one can be found, otherwise a launcher that always fails.
pub fn detect_launcher() -> Arc<dyn Launcher> {
    match ChromiumLauncher::detect() {
        Some(launcher) => {
            info!("using Chromium at {}", launcher.executable().display());
            Arc::new(launcher)
        }
        None => {
            warn!("Chromium not found; set JOBSCOUT_CHROMIUM_PATH or install Chrome");
            Arc::new(NoopLauncher)
        }
    }
}

/// Start the server and block until Ctrl-C or SIGTERM.
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ServeConfig::resolve(&args)?;
    info!(
        "starting JobScout v{} ({} sessions)",
        env!("CARGO_PKG_VERSION"),
        config.mode
    );

    let launcher = detect_launcher();
    let (state, shared) = match config.mode {
        SessionMode::Shared => {
            let shared = Arc::new(SharedSession::new(ScrapeSession::new(
                config.session.clone(),
                launcher,
            )));
            if shared.init().await {
                info!("shared browser session initialized");
            } else {
                // Keep serving so health checks can report the failure.
                error!("CRITICAL: shared browser session failed to initialize; /scrape will answer 503");
            }
            (
                AppState::new(SessionProvider::Shared(Arc::clone(&shared))),
                Some(shared),
            )
        }
        SessionMode::PerRequest => (
            AppState::new(SessionProvider::PerRequest {
                config: config.session.clone(),
                launcher,
            }),
            None,
        ),
    };

    let result = rest::start(config.addr, state, shutdown_signal()).await;

    if let Some(shared) = shared {
        info!("shutting down shared browser session");
        shared.shutdown().await;
    }
    info!("JobScout stopped");
    result
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("received shutdown signal");
}
