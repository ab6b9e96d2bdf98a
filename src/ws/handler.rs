//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /ws` — Upgrade HTTP connection to WebSocket and join the relay.
///
/// Refuses the upgrade with `503 Service Unavailable` while the relay is at
/// its connection limit. Registration re-checks capacity authoritatively for
/// upgrades that race past this pre-check.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limit = state.registry.capacity();
    if state.registry.len() >= limit {
        warn!(limit, "upgrade refused, at connection capacity");
        return RelayError::CapacityExceeded { limit }.into_response();
    }

    ws.max_message_size(state.config.max_message_bytes)
        .on_upgrade(move |socket| run_connection(socket, state))
}
