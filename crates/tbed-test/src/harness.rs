//! In-process native application for end-to-end tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tracing::debug;

use tbed_bridge::{ChannelResult, NativeHost, NativePort, StdioPort};
use tbed_protocol::{Framer, ProtocolResult, paginate, read_frame, write_frame};

/// Buffer size of each in-memory pipe.
const PIPE_CAPACITY: usize = 65_536;

type Transform = dyn Fn(&str, &str) -> String + Send + Sync;

/// A [`NativeHost`] backed by an in-process native application.
///
/// Each connection gets a task that speaks the wire protocol over an
/// in-memory pipe: it reads the command and the draft, applies the
/// transform and writes the result back, paginated at `page_size`.
#[derive(Clone)]
pub struct LoopbackHost {
    transform: Arc<Transform>,
    page_size: usize,
    sessions: Arc<Mutex<Vec<(String, String)>>>,
}

impl std::fmt::Debug for LoopbackHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackHost")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl LoopbackHost {
    /// A host whose application replies with `transform(command, draft)`.
    #[must_use]
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&str, &str) -> String + Send + Sync + 'static,
    {
        Self {
            transform: Arc::new(transform),
            page_size: usize::try_from(tbed_protocol::MAX_INBOUND_LEN).unwrap_or(usize::MAX),
            sessions: Arc::default(),
        }
    }

    /// A host whose application appends `suffix` to the draft.
    #[must_use]
    pub fn appending(suffix: &str) -> Self {
        let suffix = suffix.to_owned();
        Self::new(move |_, draft| format!("{draft}{suffix}"))
    }

    /// Page replies at `page_size` encoded bytes.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// `(command, draft)` pairs received so far.
    #[must_use]
    pub fn sessions(&self) -> Vec<(String, String)> {
        self.sessions.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NativeHost for LoopbackHost {
    async fn connect(&self, application: &str) -> ChannelResult<Box<dyn NativePort>> {
        debug!(application, "Starting loopback application");
        let (ours, theirs) = tokio::io::duplex(PIPE_CAPACITY);
        let app = self.clone();
        tokio::spawn(async move {
            if let Err(e) = app.serve(theirs).await {
                debug!(error = %e, "Loopback application stopped");
            }
        });

        let (reader, writer) = tokio::io::split(ours);
        Ok(Box::new(StdioPort::new(reader, writer)))
    }
}

impl LoopbackHost {
    async fn serve(&self, stream: DuplexStream) -> ProtocolResult<()> {
        let framer = Framer::default();
        let (mut reader, mut writer) = tokio::io::split(stream);

        let Some(first) = read_frame(&mut reader, u32::MAX).await? else {
            return Ok(());
        };
        let command = framer.parse_command(&first).unwrap_or_default().to_owned();
        let Some(draft) = read_frame(&mut reader, u32::MAX).await? else {
            return Ok(());
        };

        let reply = (self.transform)(&command, &draft);
        if let Ok(mut sessions) = self.sessions.lock() {
            sessions.push((command, draft));
        }
        for message in paginate(&framer, &reply, self.page_size)? {
            write_frame(&mut writer, message.body()).await?;
        }
        writer.shutdown().await?;
        Ok(())
    }
}

/// Install a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
