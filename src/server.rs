//! Router composition and server startup.
//!
//! Split out of `main` so integration tests can run the full relay
//! in-process on an ephemeral port.

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api;
use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the complete application router: the relay endpoint plus the
/// observability API.
#[must_use]
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serves the relay on `listener` until the accept loop ends.
///
/// # Errors
///
/// Returns any I/O error surfaced by the accept loop.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "relay listening");
    axum::serve(listener, build_app(state)).await
}
