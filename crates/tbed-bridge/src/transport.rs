//! Native-messaging transport.
//!
//! A [`NativeHost`] turns an application name into a connected
//! [`NativePort`]. Ports move whole message texts; framing onto a byte
//! stream is the port's business.

use async_trait::async_trait;
use tbed_protocol::{MAX_INBOUND_LEN, read_frame, write_frame};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::error::{ChannelError, ChannelResult};

/// Resolves and connects to native applications.
#[async_trait]
pub trait NativeHost: Send + Sync {
    /// Connect to the native application registered as `application`.
    ///
    /// # Errors
    ///
    /// Returns a connection-class [`ChannelError`] when the application is
    /// not registered, its executable is missing, or it cannot be run.
    async fn connect(&self, application: &str) -> ChannelResult<Box<dyn NativePort>>;
}

/// A connected, bidirectional message port.
#[async_trait]
pub trait NativePort: Send {
    /// Send one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be framed or written.
    async fn post(&mut self, text: &str) -> ChannelResult<()>;

    /// Next inbound message in arrival order.
    ///
    /// Returns `None` once the peer has closed its side.
    async fn next_message(&mut self) -> Option<ChannelResult<String>>;

    /// Close the port. Further calls to [`post`](Self::post) fail.
    ///
    /// # Errors
    ///
    /// Returns an error if shutting down the underlying stream fails.
    async fn close(&mut self) -> ChannelResult<()>;
}

// ---------------------------------------------------------------------------
// StdioPort
// ---------------------------------------------------------------------------

/// A [`NativePort`] over a reader/writer pair, using length-prefixed JSON
/// frames.
pub struct StdioPort<R, W> {
    reader: R,
    writer: Option<W>,
    max_inbound: u32,
}

impl<R, W> StdioPort<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wrap `reader` (peer → us) and `writer` (us → peer).
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer: Some(writer),
            max_inbound: MAX_INBOUND_LEN,
        }
    }

    /// Set the inbound frame ceiling.
    #[must_use]
    pub fn with_max_inbound(mut self, max_inbound: u32) -> Self {
        self.max_inbound = max_inbound;
        self
    }

    /// Whether the writing half is still open.
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }
}

#[async_trait]
impl<R, W> NativePort for StdioPort<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn post(&mut self, text: &str) -> ChannelResult<()> {
        let writer = self.writer.as_mut().ok_or(ChannelError::Disconnected)?;
        let written = write_frame(writer, text).await?;
        trace!(bytes = written, "Posted frame");
        Ok(())
    }

    async fn next_message(&mut self) -> Option<ChannelResult<String>> {
        match read_frame(&mut self.reader, self.max_inbound).await {
            Ok(Some(text)) => Some(Ok(text)),
            Ok(None) => {
                debug!("Peer closed the stream");
                None
            },
            Err(e) => Some(Err(e.into())),
        }
    }

    async fn close(&mut self) -> ChannelResult<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.shutdown().await?;
        }
        Ok(())
    }
}
