//! HTTP gateway for the honeypot persona.
//!
//! `GET /` and `GET /honeypot` are health checks. `POST /` and
//! `POST /honeypot` accept any body, optionally gated by `x-api-key`.

pub mod normalize;
pub mod processor;

pub use normalize::{decode_body, InboundMessage, MessageField};
pub use processor::{HoneypotReply, RequestProcessor, FALLBACK_REPLY};

use crate::config::Config;
use crate::security::{self, ApiKeyGuard, KeyCheck};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<RequestProcessor>,
    pub api_key: Arc<ApiKeyGuard>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            processor: Arc::new(RequestProcessor::from_config(&config.persona)),
            api_key: Arc::new(ApiKeyGuard::new(config.effective_api_key())),
        }
    }
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Invalid API Key")]
    InvalidApiKey,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::InvalidApiKey => StatusCode::UNAUTHORIZED,
        };
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Build the router. Layers come from `config.gateway`.
pub fn router(state: AppState, config: &Config) -> Router {
    Router::new()
        .route("/", get(handle_health).post(handle_honeypot))
        .route("/honeypot", get(handle_health).post(handle_honeypot))
        .layer(DefaultBodyLimit::max(config.gateway.max_body_bytes))
        .layer(request_timeout(config))
        .with_state(state)
}

/// Requests running past `gateway.request_timeout_secs` get a bare 408.
fn request_timeout(config: &Config) -> TimeoutLayer {
    TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        Duration::from_secs(config.gateway.request_timeout_secs),
    )
}

/// GET /, GET /honeypot: liveness only, no input processing
async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "success" }))
}

fn check_api_key(state: &AppState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let presented = headers.get(API_KEY_HEADER).map(|v| v.as_bytes());
    match state.api_key.check(presented) {
        KeyCheck::Rejected => {
            let shown = presented
                .map(|raw| security::redact(&String::from_utf8_lossy(raw)))
                .unwrap_or_default();
            tracing::warn!(presented = %shown, "rejecting request with invalid API key");
            Err(GatewayError::InvalidApiKey)
        }
        KeyCheck::Absent | KeyCheck::Accepted => Ok(()),
    }
}

/// POST /, POST /honeypot: run the persona over whatever body arrived
async fn handle_honeypot(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<HoneypotReply>, GatewayError> {
    check_api_key(&state, &headers)?;

    let value = match body {
        Ok(bytes) => decode_body(&bytes),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable honeypot body, treating as empty");
            serde_json::Value::Null
        }
    };

    Ok(Json(state.processor.handle(&value)))
}

/// Bind and serve until Ctrl-C.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind gateway to {host}:{port}"))?;
    let addr = listener
        .local_addr()
        .context("Failed to read gateway address")?;

    let state = AppState::from_config(&config);
    let picker = state.processor.responder().picker_name().to_string();
    let app = router(state, &config);

    tracing::info!(
        %addr,
        picker = %picker,
        api_key = %security::redact(config.effective_api_key()),
        "honeypot gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server error")?;

    tracing::info!("honeypot gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
