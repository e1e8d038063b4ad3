// Copyright 2026 JobScout Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP API for JobScout.
//!
//! `GET /` reports whether the scraper can take work and `POST /scrape`
//! runs one navigate-and-extract cycle. In shared mode every request goes
//! through the same browser session, one at a time; in per-request mode
//! each request launches and closes its own.

use crate::config::SessionMode;
use crate::renderer::Launcher;
use crate::session::{ScrapeSession, SessionConfig, SharedSession};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use jobscout::{JobRecord, ScrapeRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn, Instrument};

pub const SERVICE_NAME: &str = "Upwork Real Browser Scraper API";

/// Where request handlers get their browser session from.
#[derive(Clone)]
pub enum SessionProvider {
    Shared(Arc<SharedSession>),
    PerRequest {
        config: SessionConfig,
        launcher: Arc<dyn Launcher>,
    },
}

impl SessionProvider {
    pub fn mode(&self) -> SessionMode {
        match self {
            SessionProvider::Shared(_) => SessionMode::Shared,
            SessionProvider::PerRequest { .. } => SessionMode::PerRequest,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionProvider,
}

impl AppState {
    pub fn new(sessions: SessionProvider) -> Self {
        Self { sessions }
    }
}

/// Body of a successful `POST /scrape`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResponse {
    pub url: String,
    pub count: usize,
    pub jobs: Vec<JobRecord>,
}

impl ScrapeResponse {
    pub fn new(url: impl Into<String>, jobs: Vec<JobRecord>) -> Self {
        Self {
            url: url.into(),
            count: jobs.len(),
            jobs,
        }
    }
}

/// Failures a request can end in.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required field 'url' in request body.")]
    MissingUrl,
    #[error("{0}")]
    BadRequest(String),
    #[error("Scraper is not yet initialized or has failed. Please try again in a moment.")]
    NotReady,
    #[error("Failed to initialize browser session.")]
    InitFailed,
    #[error("Failed to navigate to target URL.")]
    NavigationFailed,
    #[error("Unexpected error while scraping.")]
    Unexpected(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InitFailed | ApiError::NavigationFailed | ApiError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::Unexpected(details) => json!({ "error": self.to_string(), "details": details }),
            _ => json!({ "error": self.to_string() }),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Build the axum Router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health))
        .route("/scrape", post(scrape))
        .layer(cors)
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let status = match &state.sessions {
        SessionProvider::Shared(shared) if shared.is_ready() => "ready",
        SessionProvider::Shared(_) => "initializing/failed",
        SessionProvider::PerRequest { .. } => "ok",
    };
    Json(json!({
        "status": status,
        "message": SERVICE_NAME,
        "endpoint": "/scrape",
    }))
}

async fn scrape(
    State(state): State<AppState>,
    body: Result<Json<ScrapeRequest>, JsonRejection>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let request = match body {
        Ok(Json(request)) => request,
        // No JSON content type means no body we can read a url from.
        Err(JsonRejection::MissingJsonContentType(_)) => ScrapeRequest::default(),
        Err(rejection) => return Err(ApiError::BadRequest(rejection.body_text())),
    };

    let url = request.target_url().ok_or(ApiError::MissingUrl)?.to_string();
    let max_jobs = request.max_jobs();
    let cookies = request.cookies();

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("scrape", %request_id, mode = %state.sessions.mode());
    info!(parent: &span, "scrape requested for {url} (max {max_jobs})");

    let task = tokio::spawn(
        async move {
            match state.sessions {
                SessionProvider::Shared(shared) => {
                    if !shared.is_ready() {
                        return Err(ApiError::NotReady);
                    }
                    let mut session = shared.lock().await;
                    run_scrape(&mut session, &url, max_jobs, &cookies).await
                }
                SessionProvider::PerRequest { config, launcher } => {
                    let mut session = ScrapeSession::new(config, launcher);
                    let result = if session.init().await {
                        run_scrape(&mut session, &url, max_jobs, &cookies).await
                    } else {
                        Err(ApiError::InitFailed)
                    };
                    session.close().await;
                    result
                }
            }
        }
        .instrument(span),
    );

    match task.await {
        Ok(result) => result.map(Json),
        Err(e) => {
            error!("scrape task failed: {e}");
            Err(ApiError::Unexpected(e.to_string()))
        }
    }
}

async fn run_scrape(
    session: &mut ScrapeSession,
    url: &str,
    max_jobs: usize,
    cookies: &[jobscout::StoredCookie],
) -> Result<ScrapeResponse, ApiError> {
    if !session.is_ready() {
        warn!("session is {}, refusing scrape", session.state());
        return Err(ApiError::NotReady);
    }
    session.apply_cookies(cookies).await;

    if !session.navigate_to_upwork(url).await {
        return Err(ApiError::NavigationFailed);
    }
    let jobs = session.scrape_jobs(max_jobs).await;
    info!("returning {} job(s) for {url}", jobs.len());
    Ok(ScrapeResponse::new(url, jobs))
}
