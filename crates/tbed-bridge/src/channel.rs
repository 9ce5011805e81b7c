//! The Channel Adapter.
//!
//! A [`Channel`] owns one connection to one native application for the
//! length of one edit session. It enforces the outbound size ceiling, sends
//! the editor command ahead of the draft, and feeds inbound messages to the
//! session's [`ReassemblyBuffer`] in arrival order.

use std::fmt;

use tbed_protocol::{Framer, MAX_OUTBOUND_LEN, PagerState, ReassemblyBuffer};
use tracing::{debug, info, warn};

use crate::error::{ChannelError, ChannelResult};
use crate::transport::{NativeHost, NativePort};

/// Lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Connection in progress.
    Connecting,
    /// Connected; messages may flow.
    Open,
    /// Closed normally.
    Closed,
    /// Torn down after an error.
    Failed,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Failed => "failed",
        })
    }
}

/// A reassembled reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The flattened text.
    pub text: String,
    /// Continuation pages announced for this reply (0 when unpaged).
    pub pages: u32,
    /// Transport messages consumed, announcement included.
    pub messages: usize,
}

/// One connection to one native application.
pub struct Channel {
    application: String,
    port: Box<dyn NativePort>,
    state: ChannelState,
    framer: Framer,
    outbound_limit: u64,
    bytes_sent: u64,
    bytes_received: u64,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("application", &self.application)
            .field("state", &self.state)
            .field("outbound_limit", &self.outbound_limit)
            .field("bytes_sent", &self.bytes_sent)
            .field("bytes_received", &self.bytes_received)
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Connect to `application` through `host`.
    ///
    /// # Errors
    ///
    /// Returns the host's connection error; no channel exists afterwards, so
    /// nothing can be sent.
    pub async fn open(host: &dyn NativeHost, application: &str) -> ChannelResult<Self> {
        debug!(application, state = %ChannelState::Connecting, "Opening channel");
        let port = host.connect(application).await.inspect_err(|e| {
            warn!(application, error = %e, "Failed to open channel");
        })?;
        info!(application, "Channel open");
        Ok(Self {
            application: application.to_owned(),
            port,
            state: ChannelState::Open,
            framer: Framer::default(),
            outbound_limit: MAX_OUTBOUND_LEN,
            bytes_sent: 0,
            bytes_received: 0,
        })
    }

    /// Set the outbound ceiling, in bytes.
    #[must_use]
    pub fn with_outbound_limit(mut self, limit: u64) -> Self {
        self.outbound_limit = limit;
        self
    }

    /// Use a non-default control delimiter.
    #[must_use]
    pub fn with_framer(mut self, framer: Framer) -> Self {
        self.framer = framer;
        self
    }

    /// Native application name.
    #[must_use]
    pub fn application(&self) -> &str {
        &self.application
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Payload bytes sent so far (command messages excluded).
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }

    /// Message bytes received so far.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    fn ensure_open(&self) -> ChannelResult<()> {
        if self.state == ChannelState::Open {
            Ok(())
        } else {
            Err(ChannelError::NotOpen(self.state))
        }
    }

    /// Send `payload`, preceded by a command message carrying `command`.
    ///
    /// The size check runs before anything is written: an oversized payload
    /// leaves the port untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::SizeLimitExceeded`] if `payload` is longer
    /// than the outbound limit, [`ChannelError::NotOpen`] on a closed
    /// channel, or the port's write error (which also fails the channel).
    pub async fn send(&mut self, command: &str, payload: &str) -> ChannelResult<()> {
        self.ensure_open()?;

        let len = u64::try_from(payload.len()).unwrap_or(u64::MAX);
        if len > self.outbound_limit {
            warn!(len, limit = self.outbound_limit, "Payload exceeds outbound limit");
            return Err(ChannelError::SizeLimitExceeded {
                len,
                limit: self.outbound_limit,
            });
        }

        let header = self.framer.build_command_message(command);
        let result = async {
            self.port.post(header.body()).await?;
            self.port.post(payload).await
        }
        .await;
        if let Err(e) = result {
            self.state = ChannelState::Failed;
            return Err(e);
        }

        self.bytes_sent = self.bytes_sent.saturating_add(len);
        debug!(application = %self.application, len, "Sent command and payload");
        Ok(())
    }

    /// Drive inbound messages into `handler`, in arrival order, until it
    /// yields a value.
    ///
    /// # Errors
    ///
    /// Returns the handler's error, a transport error, or
    /// [`ChannelError::Disconnected`] if the peer closes first. Any error
    /// fails the channel.
    pub async fn on_message<F, T>(&mut self, mut handler: F) -> ChannelResult<T>
    where
        F: FnMut(String) -> ChannelResult<Option<T>> + Send,
    {
        self.ensure_open()?;
        loop {
            let Some(next) = self.port.next_message().await else {
                self.state = ChannelState::Failed;
                return Err(ChannelError::Disconnected);
            };
            let step = next.and_then(|text| {
                let len = u64::try_from(text.len()).unwrap_or(u64::MAX);
                self.bytes_received = self.bytes_received.saturating_add(len);
                handler(text)
            });
            match step {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {},
                Err(e) => {
                    self.state = ChannelState::Failed;
                    return Err(e);
                },
            }
        }
    }

    /// Receive one complete reply through `buffer`.
    ///
    /// `buffer` should be owned by the session; a buffer left mid-cycle by a
    /// previous failure is rejected by the reassembler.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Protocol`] on out-of-sequence control
    /// messages, or any error from [`Channel::on_message`].
    pub async fn receive_response(
        &mut self,
        buffer: &mut ReassemblyBuffer,
    ) -> ChannelResult<Response> {
        let mut pages = 0u32;
        let mut messages = 0usize;
        let text = self
            .on_message(|text| {
                messages = messages.saturating_add(1);
                let done = buffer.push(text)?;
                if buffer.state() == PagerState::AwaitingPages {
                    pages = buffer.pending_pages();
                }
                Ok(done)
            })
            .await?;
        info!(
            application = %self.application,
            len = text.len(),
            pages,
            messages,
            "Response received"
        );
        Ok(Response {
            text,
            pages,
            messages,
        })
    }

    /// Close the channel.
    ///
    /// # Errors
    ///
    /// Returns the port's shutdown error.
    pub async fn close(mut self) -> ChannelResult<()> {
        let was = self.state;
        self.state = ChannelState::Closed;
        self.port.close().await?;
        debug!(application = %self.application, previous = %was, "Channel closed");
        Ok(())
    }
}
