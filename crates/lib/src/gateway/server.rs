//! Gateway HTTP server (single port): health, webhook, simulation and admin routes.

use crate::assistant::Assistant;
use crate::config::{self, Config};
use crate::gateway::protocol::{Ack, ReloadReply, SimulateParams, SimulateReply};
use crate::init;
use crate::nlu::MetricsSnapshot;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

const PROTOCOL_VERSION: u32 = 1;

const WEBHOOK_SECRET_HEADER: &str = "X-Webhook-Secret";

/// Shared state for the gateway routes.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub assistant: Arc<Assistant>,
    /// When Some, admin routes require `Authorization: Bearer <token>`.
    pub admin_token: Option<String>,
}

fn require_admin_token(config: &Config) -> Option<String> {
    if config.gateway.auth.mode == config::GatewayAuthMode::Token {
        config::resolve_gateway_token(config)
    } else {
        None
    }
}

/// Build the router over an existing assistant. Used by `run_gateway` and tests.
pub fn router(config: Arc<Config>, assistant: Arc<Assistant>) -> Router {
    let admin_token = require_admin_token(&config);
    let state = GatewayState {
        config,
        assistant,
        admin_token,
    };
    Router::new()
        .route("/", get(health_http))
        .route("/webhook", post(webhook))
        .route("/simulate", post(simulate))
        .route("/metrics", get(metrics))
        .route("/admin/reload-aliases", post(reload_aliases))
        .with_state(state)
}

/// Run the gateway until SIGINT or SIGTERM.
pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    init::require_initialized(&config_path, &config)?;
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        let token = config::resolve_gateway_token(&config);
        if token.is_none() || config.gateway.auth.mode != config::GatewayAuthMode::Token {
            anyhow::bail!(
                "refusing to bind gateway to {} without auth (set gateway.auth.mode to \"token\" and gateway.auth.token or TORCIDA_GATEWAY_TOKEN)",
                bind
            );
        }
    }
    if config.channels.messaging.webhook_secret.is_none() {
        log::warn!("channels.messaging.webhookSecret not set; webhook accepts unauthenticated posts");
    }

    let assistant = Assistant::from_config(&config, &config_path)
        .await
        .context("building assistant")?;
    let port = config.gateway.port;
    let app = router(Arc::new(config), Arc::new(assistant));

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for health checks).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "protocol": PROTOCOL_VERSION,
        "port": state.config.gateway.port,
    }))
}

/// POST /webhook: one event from the messaging gateway or the web widget.
/// Always 200 with an ack, except 403 on a bad secret header.
async fn webhook(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(ref expected) = state.config.channels.messaging.webhook_secret {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != expected.as_str() {
            return StatusCode::FORBIDDEN.into_response();
        }
    }
    let event: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::debug!("webhook: body is not JSON: {}", e);
            return Json(Ack::invalid_body(format!("invalid JSON: {}", e))).into_response();
        }
    };
    Json(state.assistant.handle_inbound_event(&event).await).into_response()
}

/// POST /simulate: answer a message without any transport.
async fn simulate(
    State(state): State<GatewayState>,
    Json(params): Json<SimulateParams>,
) -> Json<SimulateReply> {
    let reply = state
        .assistant
        .process_message(&params.user_id, &params.message, params.name.as_deref())
        .await;
    Json(SimulateReply { reply })
}

/// GET /metrics: classifier counters.
async fn metrics(State(state): State<GatewayState>) -> Json<MetricsSnapshot> {
    Json(state.assistant.metrics())
}

fn bearer_matches(headers: &HeaderMap, expected: &str) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim() == expected)
        .unwrap_or(false)
}

/// POST /admin/reload-aliases: rebuild the alias index from the data provider.
async fn reload_aliases(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if let Some(ref token) = state.admin_token {
        if !bearer_matches(&headers, token) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }
    match state.assistant.reload_aliases().await {
        Ok(teams) => {
            log::info!("gateway: alias index reloaded ({} teams)", teams);
            Json(ReloadReply {
                ok: true,
                teams,
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            log::warn!("gateway: alias reload failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReloadReply {
                    ok: false,
                    teams: 0,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_check() {
        let mut headers = HeaderMap::new();
        assert!(!bearer_matches(&headers, "s3cret"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(bearer_matches(&headers, "s3cret"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic s3cret"));
        assert!(!bearer_matches(&headers, "s3cret"));
    }

    #[test]
    fn admin_token_only_in_token_mode() {
        let mut config = Config::default();
        config.gateway.auth.token = Some("abc".into());
        assert_eq!(require_admin_token(&config), None);
        config.gateway.auth.mode = config::GatewayAuthMode::Token;
        if std::env::var("TORCIDA_GATEWAY_TOKEN").is_err() {
            assert_eq!(require_admin_token(&config).as_deref(), Some("abc"));
        }
    }
}
