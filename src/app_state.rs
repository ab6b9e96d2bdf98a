//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::RelayConfig;
use crate::domain::{ConnectionRegistry, Dispatcher};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Live connection store, bounded by the configured maximum.
    pub registry: Arc<ConnectionRegistry>,
    /// Broadcast fan-out over the registry.
    pub dispatcher: Arc<Dispatcher>,
    /// Startup configuration.
    pub config: Arc<RelayConfig>,
    /// Process start time, for uptime reporting.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wires the registry and dispatcher up from `config`.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new(config.max_connections));
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&registry)));
        Self {
            registry,
            dispatcher,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }
}
