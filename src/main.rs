//! ws-relay server entry point.
//!
//! Starts the Axum HTTP server with the relay and observability endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ws_relay::app_state::AppState;
use ws_relay::config::RelayConfig;
use ws_relay::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env()?;
    tracing::info!(
        addr = %config.listen_addr,
        max_connections = config.max_connections,
        queue_capacity = config.send_queue_capacity,
        policy = %config.overflow_policy,
        "starting ws-relay"
    );

    // Build application state
    let listen_addr = config.listen_addr;
    let state = AppState::new(config);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    server::serve(listener, state).await?;

    Ok(())
}
