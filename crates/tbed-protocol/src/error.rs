//! Protocol error types.

use thiserror::Error;

/// Errors raised while framing, decoding or reassembling messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A `Pages:` announcement did not carry a valid decimal count.
    #[error("malformed page count: {raw:?}")]
    MalformedPageCount {
        /// The text following the `Pages: ` label.
        raw: String,
    },

    /// A page announcement arrived before the previous cycle completed.
    #[error("page announcement for {announced} page(s) received while the previous response is incomplete ({pending} page(s) pending)")]
    UnexpectedAnnouncement {
        /// Pages still expected from the earlier announcement.
        pending: u32,
        /// Pages claimed by the new announcement.
        announced: u32,
    },

    /// A control message that is not valid in this direction or position.
    #[error("unexpected control message: {0}")]
    UnexpectedControl(String),

    /// A transport frame exceeds the permitted length.
    #[error("frame of {len} bytes exceeds the {limit} byte limit")]
    FrameTooLarge {
        /// Declared or encoded frame length.
        len: u64,
        /// The limit that was exceeded.
        limit: u64,
    },

    /// The stream ended in the middle of a frame.
    #[error("truncated frame: {0}")]
    Truncated(String),

    /// Page size too small to carry any encoded character.
    #[error("page size of {0} bytes is too small")]
    InvalidPageSize(usize),

    /// The frame payload is not a JSON string.
    #[error("invalid frame payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// IO error on the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
