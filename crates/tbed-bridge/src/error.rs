//! Error types for the bridge.

use std::path::PathBuf;

use tbed_config::ConfigError;
use tbed_protocol::ProtocolError;
use thiserror::Error;

use crate::surface::ComposeTarget;

/// Errors raised by a native-messaging channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// No manifest registers the application name.
    #[error("native application '{application}' is not registered")]
    NotRegistered {
        /// Requested application name.
        application: String,
        /// Directories that were searched.
        searched: Vec<PathBuf>,
    },

    /// A manifest exists but cannot be used.
    #[error("invalid native application manifest {path}: {reason}")]
    InvalidManifest {
        /// Manifest file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The manifest points at a program that does not exist.
    #[error("native application executable not found: {0}")]
    ExecutableMissing(PathBuf),

    /// The native application could not be executed.
    #[error("permission denied running native application: {0}")]
    PermissionDenied(PathBuf),

    /// Any other failure while establishing the connection.
    #[error("failed to connect to native application: {0}")]
    Connection(String),

    /// Outbound payload exceeds the size ceiling; nothing was sent.
    #[error("message of {len} bytes exceeds the {limit} byte limit")]
    SizeLimitExceeded {
        /// Payload size in bytes.
        len: u64,
        /// Configured ceiling.
        limit: u64,
    },

    /// The channel is not open.
    #[error("channel is {0}")]
    NotOpen(crate::channel::ChannelState),

    /// The native application went away before finishing its reply.
    #[error("native application disconnected")]
    Disconnected,

    /// Framing or reassembly failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// IO failure after the channel was opened.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChannelError {
    /// Whether this error means the connection was never established.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotRegistered { .. }
                | Self::InvalidManifest { .. }
                | Self::ExecutableMissing(_)
                | Self::PermissionDenied(_)
                | Self::Connection(_)
        )
    }
}

/// Result type for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors raised by a compose surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The target no longer exists.
    #[error("compose target not found: {0}")]
    NotFound(ComposeTarget),

    /// The surface cannot be read or written right now.
    #[error("compose surface unavailable: {0}")]
    Unavailable(String),

    /// IO error from a file-backed surface.
    #[error("compose surface I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for compose surface operations.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

/// Session-terminal errors.
///
/// Every variant abandons the session and leaves the compose target body
/// unchanged.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The channel could not be established.
    #[error("connection failed: {0}")]
    Connection(#[source] ChannelError),

    /// The draft is larger than the outbound ceiling; nothing was sent.
    #[error("draft of {len} bytes exceeds the {limit} byte limit")]
    SizeLimitExceeded {
        /// Draft size in bytes.
        len: u64,
        /// Configured ceiling.
        limit: u64,
    },

    /// The draft is not plain text.
    #[error("compose target {target} is not plain text; switch the message to plain text first")]
    UnsupportedContent {
        /// The rejected target.
        target: ComposeTarget,
    },

    /// The hotkey could not resolve exactly one compose tab.
    #[error("cannot determine which draft to edit: focused compose window has {tabs} tabs")]
    AmbiguousTarget {
        /// Number of tabs found (0 when no compose window is focused).
        tabs: usize,
    },

    /// Malformed or out-of-sequence protocol messages.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The compose surface failed.
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Editor configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Channel failure after the connection was established.
    #[error("channel error: {0}")]
    Channel(#[source] ChannelError),

    /// A session for this target is still running.
    #[error("an edit session for {target} is already running")]
    SessionActive {
        /// The busy target.
        target: ComposeTarget,
    },
}

impl From<ChannelError> for BridgeError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::SizeLimitExceeded { len, limit } => Self::SizeLimitExceeded { len, limit },
            ChannelError::Protocol(e) => Self::Protocol(e),
            e if e.is_connection_error() => Self::Connection(e),
            e => Self::Channel(e),
        }
    }
}

/// Result type for bridge sessions.
pub type BridgeResult<T> = Result<T, BridgeError>;
