//! Broadcast fan-out from one connection to all others.
//!
//! [`Dispatcher`] owns no connections; it snapshots the
//! [`ConnectionRegistry`] and enqueues a cheap clone of the message to every
//! handle except the origin. Delivery is fire-and-forget per target: a full
//! or closed queue never fails the broadcast, and no target is ever awaited.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::{ConnectionId, ConnectionRegistry, EnqueueOutcome, RelayMessage};

/// Fans inbound messages out to every other live connection.
///
/// The snapshot is taken under the registry read lock and iterated after
/// release, so one slow or dying target cannot stall registration, other
/// broadcasts, or the origin's reader.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ConnectionRegistry>,
    messages_relayed: AtomicU64,
    messages_dropped: AtomicU64,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            messages_relayed: AtomicU64::new(0),
            messages_dropped: AtomicU64::new(0),
        }
    }

    /// Relays `message` to every connection present at snapshot time except
    /// `origin`, exactly one enqueue attempt each. Kind and payload pass
    /// through untouched.
    ///
    /// Returns the number of enqueue attempts, for observability only; there
    /// is no per-target delivery guarantee. Connections that join after the
    /// snapshot receive nothing.
    pub async fn broadcast(&self, origin: ConnectionId, message: RelayMessage) -> usize {
        let targets = self.registry.snapshot().await;
        let mut attempts = 0usize;
        let mut dropped = 0u64;
        for handle in &targets {
            if handle.id() == origin {
                continue;
            }
            attempts += 1;
            let outcome = handle.enqueue(message.clone());
            match outcome {
                // Closed means the target went away between snapshot and
                // enqueue; nothing was lost that was ever deliverable.
                EnqueueOutcome::Enqueued | EnqueueOutcome::Closed => {}
                EnqueueOutcome::DroppedOldest | EnqueueOutcome::DroppedNewest => {
                    dropped += 1;
                    warn!(
                        target = %handle.id(),
                        ?outcome,
                        "outbound queue full, message dropped"
                    );
                }
                EnqueueOutcome::Disconnect => {
                    dropped += 1;
                    warn!(
                        target = %handle.id(),
                        "outbound queue full, disconnecting slow consumer"
                    );
                }
            }
        }

        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
        if dropped > 0 {
            self.messages_dropped.fetch_add(dropped, Ordering::Relaxed);
        }
        debug!(
            %origin,
            kind = %message.kind(),
            bytes = message.len(),
            targets = attempts,
            "broadcast relayed"
        );
        attempts
    }

    /// Lifetime count of inbound messages fanned out.
    #[must_use]
    pub fn messages_relayed(&self) -> u64 {
        self.messages_relayed.load(Ordering::Relaxed)
    }

    /// Lifetime count of outbound copies lost to queue overflow.
    #[must_use]
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{CloseReason, ConnectionHandle, MessageKind, OverflowPolicy};
    use std::collections::HashMap;
    use tokio_test::{assert_pending, task};

    async fn setup(count: usize) -> (Dispatcher, Vec<Arc<ConnectionHandle>>) {
        let registry = Arc::new(ConnectionRegistry::new(64));
        let mut handles = Vec::with_capacity(count);
        for _ in 0..count {
            let handle = Arc::new(ConnectionHandle::new(
                ConnectionId::new(),
                8,
                OverflowPolicy::DropOldest,
            ));
            let Ok(_) = registry.register(Arc::clone(&handle)).await else {
                panic!("registry has room");
            };
            handles.push(handle);
        }
        (Dispatcher::new(registry), handles)
    }

    #[tokio::test]
    async fn origin_is_excluded_and_others_get_exactly_one() {
        let (dispatcher, handles) = setup(3).await;
        let [a, b, c] = handles.as_slice() else {
            panic!("three handles");
        };

        let attempts = dispatcher.broadcast(a.id(), RelayMessage::text("hello")).await;
        assert_eq!(attempts, 2);

        for peer in [b, c] {
            assert_eq!(peer.next_outbound().await, Some(RelayMessage::text("hello")));
            // Exactly one copy each.
            let mut next = task::spawn(peer.next_outbound());
            assert_pending!(next.poll());
        }
        let mut origin_next = task::spawn(a.next_outbound());
        assert_pending!(origin_next.poll());
    }

    #[tokio::test]
    async fn lone_sender_reaches_no_one() {
        let (dispatcher, handles) = setup(1).await;
        let Some(a) = handles.first() else {
            panic!("one handle");
        };

        let attempts = dispatcher.broadcast(a.id(), RelayMessage::text("echo?")).await;
        assert_eq!(attempts, 0);
        assert_eq!(dispatcher.messages_relayed(), 1);
    }

    #[tokio::test]
    async fn closed_target_does_not_fail_the_broadcast() {
        let (dispatcher, handles) = setup(3).await;
        let [a, b, c] = handles.as_slice() else {
            panic!("three handles");
        };
        b.close(CloseReason::PeerDisconnected);

        let attempts = dispatcher.broadcast(a.id(), RelayMessage::text("still on")).await;
        assert_eq!(attempts, 2);
        assert_eq!(c.next_outbound().await, Some(RelayMessage::text("still on")));
        // A closed queue is not an overflow drop.
        assert_eq!(dispatcher.messages_dropped(), 0);
    }

    #[tokio::test]
    async fn kind_and_payload_pass_through_untouched() {
        let (dispatcher, handles) = setup(2).await;
        let [a, b] = handles.as_slice() else {
            panic!("two handles");
        };

        let _ = dispatcher
            .broadcast(a.id(), RelayMessage::binary(vec![0x00, 0xff, 0x7f]))
            .await;
        let Some(received) = b.next_outbound().await else {
            panic!("peer receives the binary frame");
        };
        assert_eq!(received.kind(), MessageKind::Binary);
        assert_eq!(received.as_bytes(), &[0x00, 0xff, 0x7f]);

        let _ = dispatcher
            .broadcast(a.id(), RelayMessage::text("plain text"))
            .await;
        let Some(received) = b.next_outbound().await else {
            panic!("peer receives the text frame");
        };
        assert_eq!(received.kind(), MessageKind::Text);
        assert_eq!(received.as_bytes(), b"plain text");
    }

    #[tokio::test]
    async fn per_recipient_order_follows_dispatch_order() {
        let (dispatcher, handles) = setup(2).await;
        let [a, b] = handles.as_slice() else {
            panic!("two handles");
        };

        let _ = dispatcher.broadcast(a.id(), RelayMessage::text("first")).await;
        let _ = dispatcher.broadcast(a.id(), RelayMessage::text("second")).await;

        assert_eq!(b.next_outbound().await, Some(RelayMessage::text("first")));
        assert_eq!(b.next_outbound().await, Some(RelayMessage::text("second")));
    }

    #[tokio::test]
    async fn overflow_drops_are_counted() {
        let registry = Arc::new(ConnectionRegistry::new(4));
        let sender = Arc::new(ConnectionHandle::new(
            ConnectionId::new(),
            8,
            OverflowPolicy::DropOldest,
        ));
        let slow = Arc::new(ConnectionHandle::new(
            ConnectionId::new(),
            1,
            OverflowPolicy::DropOldest,
        ));
        let _ = registry.register(Arc::clone(&sender)).await;
        let _ = registry.register(Arc::clone(&slow)).await;
        let dispatcher = Dispatcher::new(registry);

        let _ = dispatcher.broadcast(sender.id(), RelayMessage::text("m1")).await;
        let _ = dispatcher.broadcast(sender.id(), RelayMessage::text("m2")).await;

        assert_eq!(dispatcher.messages_relayed(), 2);
        assert_eq!(dispatcher.messages_dropped(), 1);
        // The survivor is the most recent message.
        assert_eq!(slow.next_outbound().await, Some(RelayMessage::text("m2")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_broadcasts_keep_per_origin_order() {
        const PER_ORIGIN: u16 = 100;

        let registry = Arc::new(ConnectionRegistry::new(4));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let handle = Arc::new(ConnectionHandle::new(
                ConnectionId::new(),
                usize::from(PER_ORIGIN) * 2,
                OverflowPolicy::DropOldest,
            ));
            let Ok(_) = registry.register(Arc::clone(&handle)).await else {
                panic!("registry has room");
            };
            handles.push(handle);
        }
        let dispatcher = Arc::new(Dispatcher::new(registry));
        let [a, b, c] = handles.as_slice() else {
            panic!("three handles");
        };

        let mut senders = Vec::new();
        for (tag, origin) in [(0u8, a.id()), (1u8, b.id())] {
            let dispatcher = Arc::clone(&dispatcher);
            senders.push(tokio::spawn(async move {
                for seq in 0..PER_ORIGIN {
                    let [hi, lo] = seq.to_be_bytes();
                    let _ = dispatcher
                        .broadcast(origin, RelayMessage::binary(vec![tag, hi, lo]))
                        .await;
                }
            }));
        }
        for sender in senders {
            assert!(sender.await.is_ok());
        }

        // The handle both origins target saw every message, each origin's
        // stream still in its send order.
        let mut next_seq: HashMap<u8, u16> = HashMap::new();
        for _ in 0..2 * usize::from(PER_ORIGIN) {
            let Some(message) = c.next_outbound().await else {
                panic!("shared target closed early");
            };
            let &[tag, hi, lo] = message.as_bytes() else {
                panic!("three-byte payload");
            };
            let expected = next_seq.entry(tag).or_insert(0);
            assert_eq!(u16::from_be_bytes([hi, lo]), *expected);
            *expected += 1;
        }
        assert_eq!(c.dropped(), 0);
        assert_eq!(dispatcher.messages_relayed(), u64::from(PER_ORIGIN) * 2);
        assert_eq!(dispatcher.messages_dropped(), 0);
    }
}
