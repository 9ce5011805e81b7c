//! Application-level messages carried inside transport frames.

use serde::{Deserialize, Serialize};

/// What role a message plays in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// `--tbed-hdr` + `Command: <editor command>`, the first message of a session.
    Command,
    /// Plain text: the draft going out, or the final (terminal) piece coming back.
    Payload,
    /// Plain text consumed while pages are still pending.
    Continuation,
    /// `--tbed-hdr` + `Pages: <N>`, announcing `N` continuation messages.
    PageAnnouncement,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Command => "command",
            Self::Payload => "payload",
            Self::Continuation => "continuation",
            Self::PageAnnouncement => "page-announcement",
        };
        f.write_str(name)
    }
}

/// A single message exchanged over a channel.
///
/// `body` is the exact text placed in the transport frame, header included
/// for control messages. Messages are immutable once built; ordering is
/// implicit in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    kind: MessageKind,
    body: String,
}

impl Message {
    /// Build a message of the given kind.
    #[must_use]
    pub fn new(kind: MessageKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// Plain payload text.
    #[must_use]
    pub fn payload(body: impl Into<String>) -> Self {
        Self::new(MessageKind::Payload, body)
    }

    /// Plain continuation text.
    #[must_use]
    pub fn continuation(body: impl Into<String>) -> Self {
        Self::new(MessageKind::Continuation, body)
    }

    /// The message kind.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// The wire text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Consume the message, returning the wire text.
    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }

    /// Length of the wire text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the wire text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Whether this message carries a `--tbed-hdr` header.
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self.kind, MessageKind::Command | MessageKind::PageAnnouncement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_accessors() {
        let msg = Message::payload("Hello world");
        assert_eq!(msg.kind(), MessageKind::Payload);
        assert_eq!(msg.body(), "Hello world");
        assert_eq!(msg.len(), 11);
        assert!(!msg.is_control());
        assert_eq!(msg.into_body(), "Hello world");
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&MessageKind::PageAnnouncement).unwrap();
        assert_eq!(json, "\"page_announcement\"");
        assert_eq!(MessageKind::PageAnnouncement.to_string(), "page-announcement");
    }
}
