//! Domain layer: connection identity, registry, queues, and broadcast.
//!
//! This module contains the relay's transport-independent core: connection
//! identity, the shared per-connection handle with its bounded outbound
//! queue, the concurrent connection registry, and the dispatcher that fans
//! one connection's messages out to all others.

pub mod connection_handle;
pub mod connection_id;
pub mod dispatcher;
pub mod message;
pub mod registry;
pub mod send_queue;

pub use connection_handle::{CloseReason, ConnectionHandle};
pub use connection_id::ConnectionId;
pub use dispatcher::Dispatcher;
pub use message::{MessageKind, RelayMessage};
pub use registry::ConnectionRegistry;
pub use send_queue::{EnqueueOutcome, OverflowPolicy, ParseOverflowPolicyError, SendQueue};
