//! WebSocket connection state machine.
//!
//! Each accepted socket moves through Connecting → Active → Closing →
//! Closed. The reader task (this module's entry point) drives the broadcast
//! dispatcher; a detached writer task drains the connection's outbound queue,
//! so a slow peer stalls neither its own reads nor anyone else's relay.

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::domain::{CloseReason, ConnectionHandle, ConnectionId, RelayMessage};

/// Lifecycle states of a single connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Upgrade completed, not yet registered.
    Connecting,
    /// Registered; frames relay in both directions.
    Active,
    /// Teardown under way; no further relaying from this connection.
    Closing,
    /// Unregistered, queue discarded, writer finished. Terminal.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Active => write!(f, "active"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

fn transition(id: ConnectionId, state: &mut ConnectionState, to: ConnectionState) {
    debug!(%id, from = %*state, to = %to, "connection state");
    *state = to;
}

/// Supervises one WebSocket connection from upgrade to teardown.
///
/// Registers a fresh handle, spawns the writer task, then reads inbound
/// frames until the peer goes away, a frame fails, or the handle is closed
/// from outside. Every exit path unregisters and closes exactly once.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let handle = Arc::new(ConnectionHandle::new(
        ConnectionId::new(),
        state.config.send_queue_capacity,
        state.config.overflow_policy,
    ));
    let id = handle.id();
    let mut lifecycle = ConnectionState::Connecting;

    let (sink, stream) = socket.split();

    // Authoritative capacity check; upgrades that raced past the handler's
    // pre-check end here before ever becoming visible to broadcasts.
    if let Err(err) = state.registry.register(Arc::clone(&handle)).await {
        warn!(%id, error = %err, "registration refused after upgrade");
        close_sink(sink).await;
        transition(id, &mut lifecycle, ConnectionState::Closed);
        return;
    }
    transition(id, &mut lifecycle, ConnectionState::Active);
    info!(%id, active = state.registry.len(), "connection open");

    let writer = tokio::spawn(write_outbound(sink, Arc::clone(&handle)));

    let reason = read_inbound(stream, &handle, &state).await;

    // Unregister first so new snapshots stop targeting this id, then close
    // the handle (a no-op if the writer or dispatcher already did).
    transition(id, &mut lifecycle, ConnectionState::Closing);
    state.registry.unregister(id).await;
    handle.close(reason);
    let _ = writer.await;

    transition(id, &mut lifecycle, ConnectionState::Closed);
    let reason = handle.close_reason().unwrap_or(reason);
    let session_secs = (chrono::Utc::now() - handle.connected_at()).num_seconds();
    info!(
        %id,
        %reason,
        session_secs,
        dropped = handle.dropped(),
        active = state.registry.len(),
        "connection closed"
    );
}

/// Reads inbound frames until the connection is done, returning why.
///
/// Text and Binary frames go to the dispatcher; the transport answers pings
/// itself. An external close (write failure, overflow disconnect) cancels
/// the pending read through the handle's closed signal.
async fn read_inbound(
    mut stream: SplitStream<WebSocket>,
    handle: &Arc<ConnectionHandle>,
    state: &AppState,
) -> CloseReason {
    loop {
        tokio::select! {
            () = handle.closed() => {
                return handle.close_reason().unwrap_or(CloseReason::PeerDisconnected);
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let _ = state
                            .dispatcher
                            .broadcast(handle.id(), RelayMessage::text(text))
                            .await;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        let _ = state
                            .dispatcher
                            .broadcast(handle.id(), RelayMessage::binary(data))
                            .await;
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        return CloseReason::PeerDisconnected;
                    }
                    Some(Err(err)) => {
                        warn!(id = %handle.id(), error = %err, "inbound frame failed");
                        return CloseReason::MalformedFrame;
                    }
                }
            }
        }
    }
}

/// Drains the outbound queue into the socket until the handle closes.
///
/// A write failure closes the handle (waking the reader) and stops draining.
/// Runs as its own task so each connection's writes pace only themselves.
async fn write_outbound(mut sink: SplitSink<WebSocket, Message>, handle: Arc<ConnectionHandle>) {
    while let Some(message) = handle.next_outbound().await {
        if let Err(err) = sink.send(message.into()).await {
            debug!(id = %handle.id(), error = %err, "outbound write failed");
            handle.close(CloseReason::WriteFailure);
            break;
        }
    }
    close_sink(sink).await;
}

/// Best-effort Close frame; the peer may already be gone.
async fn close_sink(mut sink: SplitSink<WebSocket, Message>) {
    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
}
