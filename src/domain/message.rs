//! The relayed message: an opaque payload tagged text or binary.
//!
//! [`RelayMessage`] is immutable once constructed and cheap to clone — both
//! variants wrap refcounted byte buffers, so one broadcast shares a single
//! payload allocation across every fan-out target.

use std::fmt;

use axum::extract::ws;
use axum::extract::ws::Utf8Bytes;
use bytes::Bytes;

/// Framing kind of a relayed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// UTF-8 text frame.
    Text,
    /// Opaque binary frame.
    Binary,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// An opaque payload relayed verbatim from one connection to all others.
///
/// The relay never inspects or converts payloads: a text frame stays text,
/// a binary frame stays binary, byte for byte. The variants hold the
/// transport's native shared buffers ([`Utf8Bytes`] / [`Bytes`]) so cloning
/// for fan-out is O(1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayMessage {
    /// UTF-8 text payload.
    Text(Utf8Bytes),
    /// Binary payload.
    Binary(Bytes),
}

impl RelayMessage {
    /// Creates a text message.
    pub fn text(payload: impl Into<Utf8Bytes>) -> Self {
        Self::Text(payload.into())
    }

    /// Creates a binary message.
    pub fn binary(payload: impl Into<Bytes>) -> Self {
        Self::Binary(payload.into())
    }

    /// Returns the framing kind.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::Binary(_) => MessageKind::Binary,
        }
    }

    /// Returns the payload as raw bytes, regardless of kind.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_str().as_bytes(),
            Self::Binary(data) => data,
        }
    }

    /// Returns the payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<RelayMessage> for ws::Message {
    /// Converts back to a transport frame, preserving kind and bytes exactly.
    fn from(message: RelayMessage) -> Self {
        match message {
            RelayMessage::Text(text) => Self::Text(text),
            RelayMessage::Binary(data) => Self::Binary(data),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn text_constructor_preserves_payload() {
        let msg = RelayMessage::text("hello");
        assert_eq!(msg.kind(), MessageKind::Text);
        assert_eq!(msg.as_bytes(), b"hello");
        assert_eq!(msg.len(), 5);
    }

    #[test]
    fn binary_constructor_preserves_payload() {
        let msg = RelayMessage::binary(vec![0x01, 0x02]);
        assert_eq!(msg.kind(), MessageKind::Binary);
        assert_eq!(msg.as_bytes(), &[0x01, 0x02]);
    }

    #[test]
    fn empty_payload() {
        let msg = RelayMessage::binary(Vec::new());
        assert!(msg.is_empty());
        assert_eq!(msg.len(), 0);
    }

    #[test]
    fn clone_shares_the_backing_buffer() {
        let msg = RelayMessage::binary(vec![0u8; 1024]);
        let copy = msg.clone();
        // Bytes clones share the same allocation; compare slice pointers.
        assert_eq!(msg.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }

    #[test]
    fn into_frame_keeps_text_kind() {
        let frame = ws::Message::from(RelayMessage::text("hi"));
        let ws::Message::Text(text) = frame else {
            panic!("expected a text frame");
        };
        assert_eq!(text.as_str(), "hi");
    }

    #[test]
    fn into_frame_keeps_binary_kind() {
        let frame = ws::Message::from(RelayMessage::binary(vec![0xde, 0xad]));
        let ws::Message::Binary(data) = frame else {
            panic!("expected a binary frame");
        };
        assert_eq!(data.as_ref(), &[0xde, 0xad]);
    }

    #[test]
    fn kind_display() {
        assert_eq!(MessageKind::Text.to_string(), "text");
        assert_eq!(MessageKind::Binary.to_string(), "binary");
    }
}
