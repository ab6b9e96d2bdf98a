//! Shared per-connection handle: identity, outbound queue, and close state.
//!
//! A handle is created when a socket upgrades and is jointly owned (via `Arc`)
//! by the registry, the dispatcher's snapshots, and the connection's own
//! tasks. Everything on it is safe to call from any task; `close` wins
//! exactly once no matter how many paths race to it.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::{ConnectionId, EnqueueOutcome, OverflowPolicy, RelayMessage, SendQueue};

/// Why a connection was closed. Recorded by the first `close` call and
/// carried into the lifecycle's final log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer sent a Close frame or ended the stream.
    PeerDisconnected,
    /// Writing to the socket failed.
    WriteFailure,
    /// Reading from the socket failed (protocol violation or transport error).
    MalformedFrame,
    /// The outbound queue overflowed under [`OverflowPolicy::Disconnect`].
    QueueOverflow,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerDisconnected => write!(f, "peer-disconnected"),
            Self::WriteFailure => write!(f, "write-failure"),
            Self::MalformedFrame => write!(f, "malformed-frame"),
            Self::QueueOverflow => write!(f, "queue-overflow"),
        }
    }
}

/// Control surface for one live connection.
///
/// Producers enqueue broadcast copies through it, the connection's writer
/// drains it, and any task may close it. Closing is idempotent: the first
/// caller records the [`CloseReason`], discards the queue and trips the
/// [`closed`](Self::closed) signal; later callers are no-ops.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    queue: SendQueue,
    cancel: CancellationToken,
    close_reason: OnceLock<CloseReason>,
    connected_at: DateTime<Utc>,
}

impl ConnectionHandle {
    /// Creates a handle with a fresh outbound queue.
    #[must_use]
    pub fn new(id: ConnectionId, queue_capacity: usize, policy: OverflowPolicy) -> Self {
        Self {
            id,
            queue: SendQueue::new(queue_capacity, policy),
            cancel: CancellationToken::new(),
            close_reason: OnceLock::new(),
            connected_at: Utc::now(),
        }
    }

    /// This connection's id.
    #[must_use]
    pub const fn id(&self) -> ConnectionId {
        self.id
    }

    /// When the connection was accepted.
    #[must_use]
    pub const fn connected_at(&self) -> DateTime<Utc> {
        self.connected_at
    }

    /// Queues an outbound message without blocking.
    ///
    /// On a closed handle this is a silent no-op. Under
    /// [`OverflowPolicy::Disconnect`] a full queue closes the handle with
    /// [`CloseReason::QueueOverflow`] before returning.
    pub fn enqueue(&self, message: RelayMessage) -> EnqueueOutcome {
        let outcome = self.queue.push(message);
        if outcome == EnqueueOutcome::Disconnect {
            self.close(CloseReason::QueueOverflow);
        }
        outcome
    }

    /// Closes the connection, recording `reason`.
    ///
    /// Returns `true` for the call that actually performed the close. The
    /// recorded reason never changes afterwards.
    pub fn close(&self, reason: CloseReason) -> bool {
        if self.close_reason.set(reason).is_err() {
            return false;
        }
        self.queue.close();
        self.cancel.cancel();
        true
    }

    /// Resolves once [`close`](Self::close) has been called. Cancel-safe,
    /// usable as a `select!` arm.
    pub async fn closed(&self) {
        self.cancel.cancelled().await;
    }

    /// Whether a close has been recorded.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.close_reason.get().is_some()
    }

    /// The reason recorded by the winning close, if any yet.
    #[must_use]
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.get().copied()
    }

    /// Next queued outbound message, FIFO; `None` once the handle is closed
    /// and the queue is drained. The writer task's suspension point.
    pub async fn next_outbound(&self) -> Option<RelayMessage> {
        self.queue.pop().await
    }

    /// Messages this connection has lost to queue overflow.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }
}
