//! HTTP API layer: observability endpoints and router composition.
//!
//! The relay's HTTP surface besides `/ws` itself: `/health` and `/stats`,
//! mounted at the root level.

pub mod handlers;

use axum::Router;

use crate::app_state::AppState;

/// Builds the HTTP API router.
pub fn build_router() -> Router<AppState> {
    Router::new().merge(handlers::system::routes())
}
