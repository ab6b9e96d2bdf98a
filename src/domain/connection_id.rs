//! Connection identity.
//!
//! [`ConnectionId`] wraps a random [`uuid::Uuid`] so connection identifiers
//! cannot be mixed up with any other UUID in the system. The relay only ever
//! mints fresh ids: one per accepted socket, at upgrade time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for one relay connection.
///
/// Minted when the connection's handle is built and immutable for the
/// connection's lifetime. The registry keys its map with it and the
/// dispatcher uses it to keep a broadcast away from its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    /// Mints a fresh random id (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_id_is_distinct() {
        let mut seen = HashSet::new();
        for _ in 0..64 {
            assert!(seen.insert(ConnectionId::new()));
        }
    }

    #[test]
    fn default_mints_a_fresh_id() {
        let first = ConnectionId::default();
        let second = ConnectionId::default();
        assert_ne!(first, second);
    }

    #[test]
    fn displays_as_hyphenated_uuid() {
        let rendered = ConnectionId::new().to_string();
        assert_eq!(rendered.len(), 36);
        assert_eq!(rendered.matches('-').count(), 4);
    }

    #[test]
    fn serializes_transparently_as_a_string() {
        let id = ConnectionId::new();
        let Ok(value) = serde_json::to_value(id) else {
            panic!("serialization failed");
        };
        assert_eq!(value, serde_json::Value::String(id.to_string()));

        let Ok(back) = serde_json::from_value::<ConnectionId>(value) else {
            panic!("deserialization failed");
        };
        assert_eq!(back, id);
    }
}
