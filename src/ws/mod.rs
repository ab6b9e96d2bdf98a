//! WebSocket layer: the upgrade endpoint and per-connection supervision.
//!
//! The WebSocket endpoint at `/ws` is the relay itself: every Text or
//! Binary frame a client sends is fanned out to all other connected clients.

pub mod connection;
pub mod handler;
