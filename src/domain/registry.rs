//! Concurrent connection storage shared by the upgrade path and the
//! broadcast dispatcher.
//!
//! [`ConnectionRegistry`] maps connection ids to shared [`ConnectionHandle`]s
//! behind a `tokio::sync::RwLock`. Broadcasts take a point-in-time
//! [`snapshot`](ConnectionRegistry::snapshot) under the read lock and iterate
//! after releasing it, so a slow target can never hold the map hostage.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::RwLock;

use super::{ConnectionHandle, ConnectionId};
use crate::error::RelayError;

/// Central store for all live connections, bounded at `max_connections`.
///
/// # Concurrency
///
/// - Registration and removal take the write lock briefly; neither performs
///   any I/O while holding it.
/// - Snapshots take the read lock only long enough to clone the handle refs.
/// - [`len`](Self::len) reads an atomic counter maintained alongside the map,
///   so observability paths never touch the lock.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<ConnectionId, Arc<ConnectionHandle>>>,
    active: AtomicUsize,
    accepted: AtomicU64,
    max_connections: usize,
}

impl ConnectionRegistry {
    /// Creates an empty registry admitting at most `max_connections`
    /// (floored at 1).
    #[must_use]
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active: AtomicUsize::new(0),
            accepted: AtomicU64::new(0),
            max_connections: max_connections.max(1),
        }
    }

    /// Adds a connection, returning its id.
    ///
    /// This is the authoritative capacity check: upgrades that raced past the
    /// handler's pre-check are rejected here. Ids are UUID v4, so an insert
    /// never displaces an existing entry in practice.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::CapacityExceeded`] when the registry is full.
    pub async fn register(
        &self,
        handle: Arc<ConnectionHandle>,
    ) -> Result<ConnectionId, RelayError> {
        let id = handle.id();
        let mut map = self.connections.write().await;
        if map.len() >= self.max_connections {
            return Err(RelayError::CapacityExceeded {
                limit: self.max_connections,
            });
        }
        map.insert(id, handle);
        self.active.store(map.len(), Ordering::Relaxed);
        self.accepted.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Removes a connection. Idempotent: removing an id that is absent (or
    /// was already removed) returns `false`.
    pub async fn unregister(&self, id: ConnectionId) -> bool {
        let mut map = self.connections.write().await;
        let removed = map.remove(&id).is_some();
        self.active.store(map.len(), Ordering::Relaxed);
        removed
    }

    /// Point-in-time copy of all handle refs.
    ///
    /// The returned vec stays valid to iterate while connections register or
    /// unregister concurrently; enqueues to a handle closed after the
    /// snapshot are silent no-ops.
    pub async fn snapshot(&self) -> Vec<Arc<ConnectionHandle>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Number of live connections. Lock-free.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }

    /// Returns `true` if no connections are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lifetime count of connections ever admitted. Lock-free.
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    /// The configured connection limit.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_connections
    }
}
