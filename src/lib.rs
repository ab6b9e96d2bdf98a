//! # ws-relay
//!
//! Real-time WebSocket broadcast relay: every Text or Binary frame a client
//! sends to `/ws` is fanned out, payload untouched, to all other connected
//! clients.
//!
//! The core is the connection registry and broadcast dispatcher: a dynamic
//! set of concurrent connections, point-in-time snapshots for fan-out, and a
//! bounded per-connection outbound queue so one slow consumer never stalls
//! the rest of the relay.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── Upgrade handler + connection lifecycle (ws/)
//!     ├── Health and stats endpoints (api/)
//!     │
//!     ├── Dispatcher (domain/)
//!     └── ConnectionRegistry ── ConnectionHandle ── SendQueue (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod ws;
