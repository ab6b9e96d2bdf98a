//! Bounded outbound queue with a configurable overflow policy.
//!
//! Every connection owns one [`SendQueue`]. Broadcast producers push without
//! ever blocking; the connection's writer task is the single consumer and
//! drains in FIFO order. When the queue is full the [`OverflowPolicy`]
//! decides what gives: the oldest queued message (default), the new message,
//! or the connection itself.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use super::RelayMessage;

/// Rule applied when a full queue must admit a new message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Evict the oldest queued message to admit the new one. Bounds memory
    /// under a slow consumer without ever stalling the broadcaster.
    #[default]
    DropOldest,
    /// Discard the new message, keeping what is already queued.
    DropNewest,
    /// Discard the new message and close the connection.
    Disconnect,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DropOldest => write!(f, "drop-oldest"),
            Self::DropNewest => write!(f, "drop-newest"),
            Self::Disconnect => write!(f, "disconnect"),
        }
    }
}

/// Error returned when an overflow policy string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown overflow policy `{0}` (expected drop-oldest, drop-newest or disconnect)")]
pub struct ParseOverflowPolicyError(String);

impl FromStr for OverflowPolicy {
    type Err = ParseOverflowPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop-oldest" => Ok(Self::DropOldest),
            "drop-newest" => Ok(Self::DropNewest),
            "disconnect" => Ok(Self::Disconnect),
            other => Err(ParseOverflowPolicyError(other.to_string())),
        }
    }
}

/// Result of one enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Message appended; the queue was below capacity.
    Enqueued,
    /// Queue was full; the oldest queued message was evicted to admit this one.
    DroppedOldest,
    /// Queue was full; this message was discarded.
    DroppedNewest,
    /// Queue was full under [`OverflowPolicy::Disconnect`]; the message was
    /// discarded and the caller must close the connection.
    Disconnect,
    /// The queue is closed; the message was silently discarded.
    Closed,
}

impl EnqueueOutcome {
    /// Returns `true` if the message was admitted to the queue, possibly at
    /// the cost of an older one.
    #[must_use]
    pub const fn admitted(&self) -> bool {
        matches!(self, Self::Enqueued | Self::DroppedOldest)
    }
}

/// Bounded FIFO queue between broadcast producers and one writer task.
///
/// Producers call [`push`](Self::push) from any task without blocking; the
/// single consumer awaits [`pop`](Self::pop). [`close`](Self::close) discards
/// anything still queued and wakes the consumer, which then observes `None`.
///
/// Internally a `std::sync::Mutex` guards the deque — critical sections never
/// await, so holding the lock across tasks is not possible.
#[derive(Debug)]
pub struct SendQueue {
    inner: Mutex<Inner>,
    ready: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

#[derive(Debug)]
struct Inner {
    items: VecDeque<RelayMessage>,
    closed: bool,
    dropped: u64,
}

impl SendQueue {
    /// Creates a queue holding at most `capacity` messages (floored at 1).
    #[must_use]
    pub fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(capacity),
                closed: false,
                dropped: 0,
            }),
            ready: Notify::new(),
            capacity,
            policy,
        }
    }

    /// Attempts to append `message` without blocking.
    ///
    /// At capacity the configured [`OverflowPolicy`] applies; on a closed
    /// queue the message is silently discarded. The returned
    /// [`EnqueueOutcome`] says which of those happened.
    pub fn push(&self, message: RelayMessage) -> EnqueueOutcome {
        let outcome = {
            let mut inner = self.lock();
            if inner.closed {
                EnqueueOutcome::Closed
            } else if inner.items.len() < self.capacity {
                inner.items.push_back(message);
                EnqueueOutcome::Enqueued
            } else {
                inner.dropped = inner.dropped.saturating_add(1);
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        inner.items.pop_front();
                        inner.items.push_back(message);
                        EnqueueOutcome::DroppedOldest
                    }
                    OverflowPolicy::DropNewest => EnqueueOutcome::DroppedNewest,
                    OverflowPolicy::Disconnect => EnqueueOutcome::Disconnect,
                }
            }
        };
        if outcome.admitted() {
            self.ready.notify_one();
        }
        outcome
    }

    /// Waits for the next queued message, in FIFO order.
    ///
    /// Returns `None` once the queue is closed and nothing is pending.
    /// Intended for a single consumer (the connection's writer task).
    /// Cancel-safe: no message is lost if the returned future is dropped
    /// before completion.
    pub async fn pop(&self) -> Option<RelayMessage> {
        loop {
            // Register interest before re-checking so a push between the
            // check and the await is not lost.
            let ready = self.ready.notified();
            {
                let mut inner = self.lock();
                if let Some(message) = inner.items.pop_front() {
                    return Some(message);
                }
                if inner.closed {
                    return None;
                }
            }
            ready.await;
        }
    }

    /// Closes the queue: discards pending messages and wakes the consumer.
    ///
    /// Idempotent. Returns the number of messages discarded by this call.
    pub fn close(&self) -> usize {
        let discarded = {
            let mut inner = self.lock();
            if inner.closed {
                return 0;
            }
            inner.closed = true;
            let pending = inner.items.len();
            inner.items.clear();
            pending
        };
        self.ready.notify_one();
        discarded
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of messages currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Lifetime count of messages dropped by overflow handling.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    /// Maximum number of queued messages.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoning panic cannot leave Inner half-updated; keep going.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
