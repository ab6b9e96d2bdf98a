//! System endpoints: health check and relay statistics.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Live relay statistics.
#[derive(Debug, Serialize)]
struct StatsResponse {
    active_connections: usize,
    max_connections: usize,
    connections_accepted: u64,
    messages_relayed: u64,
    messages_dropped: u64,
    uptime_secs: i64,
}

/// `GET /stats` — Current relay counters.
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(StatsResponse {
            active_connections: state.registry.len(),
            max_connections: state.registry.capacity(),
            connections_accepted: state.registry.accepted(),
            messages_relayed: state.dispatcher.messages_relayed(),
            messages_dropped: state.dispatcher.messages_dropped(),
            uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
}
