//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). See the README for the full list of
//! configuration keys.

use std::net::SocketAddr;

use crate::domain::{OverflowPolicy, ParseOverflowPolicyError};
use crate::error::RelayError;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Maximum number of concurrent WebSocket connections.
    pub max_connections: usize,

    /// Outbound queue capacity per connection, in messages (floored at 1).
    pub send_queue_capacity: usize,

    /// What a full outbound queue does with new messages.
    pub overflow_policy: OverflowPolicy,

    /// Maximum accepted inbound frame size, in bytes.
    pub max_message_bytes: usize,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Config`] if `LISTEN_ADDR` is set but is not a
    /// valid socket address, or if `OVERFLOW_POLICY` is set to an unknown
    /// policy name. Numeric variables fall back to their defaults instead of
    /// erroring.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| RelayError::Config {
                key: "LISTEN_ADDR",
                reason: e.to_string(),
            })?;

        let overflow_policy: OverflowPolicy = match std::env::var("OVERFLOW_POLICY") {
            Ok(raw) => raw.parse().map_err(|e: ParseOverflowPolicyError| RelayError::Config {
                key: "OVERFLOW_POLICY",
                reason: e.to_string(),
            })?,
            Err(_) => OverflowPolicy::default(),
        };

        Ok(Self {
            listen_addr,
            max_connections: parse_env("MAX_CONNECTIONS", 1024),
            send_queue_capacity: parse_env("SEND_QUEUE_CAPACITY", 256),
            overflow_policy,
            max_message_bytes: parse_env("MAX_MESSAGE_BYTES", 1024 * 1024),
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
