//! Mock implementations for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tbed_bridge::{
    ChannelError, ChannelResult, ComposeDetails, ComposeSurface, ComposeTarget, ComposeWindow,
    NativeHost, NativePort, SurfaceError, SurfaceResult,
};

// ---------------------------------------------------------------------------
// MockComposeSurface
// ---------------------------------------------------------------------------

/// Mock implementation of [`ComposeSurface`].
///
/// Uses `std::sync::Mutex` internally so builder methods work without a
/// tokio runtime. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockComposeSurface {
    /// Drafts by target.
    bodies: Arc<Mutex<HashMap<ComposeTarget, ComposeDetails>>>,
    /// Focused compose window.
    focused: Arc<Mutex<Option<ComposeWindow>>>,
    /// Captured `show_error` messages.
    error_messages: Arc<Mutex<Vec<String>>>,
    /// Number of `set_plain_text_body` calls.
    writes: Arc<Mutex<usize>>,
}

impl MockComposeSurface {
    /// Create an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain-text draft.
    #[must_use]
    pub fn with_plain(self, target: &str, body: &str) -> Self {
        self.insert(target, ComposeDetails::plain(body));
        self
    }

    /// Add a rich-text draft.
    #[must_use]
    pub fn with_rich(self, target: &str, body: &str) -> Self {
        self.insert(target, ComposeDetails::rich(body));
        self
    }

    /// Set the focused window's tabs.
    #[must_use]
    pub fn with_focused_tabs(self, tabs: &[&str]) -> Self {
        if let Ok(mut guard) = self.focused.lock() {
            *guard = Some(ComposeWindow::new(
                tabs.iter().map(|t| ComposeTarget::new(*t)).collect(),
            ));
        }
        self
    }

    /// Insert or replace a draft.
    pub fn insert(&self, target: &str, details: ComposeDetails) {
        if let Ok(mut guard) = self.bodies.lock() {
            guard.insert(ComposeTarget::new(target), details);
        }
    }

    /// Current body of `target`.
    #[must_use]
    pub fn body(&self, target: &str) -> Option<String> {
        self.bodies
            .lock()
            .ok()
            .and_then(|g| g.get(&ComposeTarget::new(target)).map(|d| d.plain_text_body.clone()))
    }

    /// Number of body writes so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|g| *g).unwrap_or_default()
    }

    /// Get captured error messages.
    #[must_use]
    pub fn get_error_messages(&self) -> Vec<String> {
        self.error_messages
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ComposeSurface for MockComposeSurface {
    async fn get_plain_text_body(&self, target: &ComposeTarget) -> SurfaceResult<ComposeDetails> {
        self.bodies
            .lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?
            .get(target)
            .cloned()
            .ok_or_else(|| SurfaceError::NotFound(target.clone()))
    }

    async fn set_plain_text_body(&self, target: &ComposeTarget, body: &str) -> SurfaceResult<()> {
        let mut bodies = self
            .bodies
            .lock()
            .map_err(|e| SurfaceError::Unavailable(e.to_string()))?;
        let Some(details) = bodies.get_mut(target) else {
            return Err(SurfaceError::NotFound(target.clone()));
        };
        body.clone_into(&mut details.plain_text_body);
        if let Ok(mut writes) = self.writes.lock() {
            *writes = writes.saturating_add(1);
        }
        Ok(())
    }

    async fn focused_window(&self) -> SurfaceResult<Option<ComposeWindow>> {
        Ok(self.focused.lock().ok().and_then(|g| g.clone()))
    }

    fn show_error(&self, _target: Option<&ComposeTarget>, message: &str) {
        if let Ok(mut guard) = self.error_messages.lock() {
            guard.push(message.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedHost
// ---------------------------------------------------------------------------

/// How a [`ScriptedHost`] fails to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectFailure {
    /// No manifest for the application.
    NotRegistered,
    /// The executable is missing.
    ExecutableMissing,
    /// The executable cannot be run.
    PermissionDenied,
}

/// A [`NativeHost`] whose ports replay a fixed reply.
///
/// Every port records what was posted into a log shared with the host, then
/// hands out the scripted reply in order, then reports end of stream.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    reply: Vec<String>,
    posted: Arc<Mutex<Vec<String>>>,
    connects: Arc<Mutex<Vec<String>>>,
    failure: Option<ConnectFailure>,
}

impl ScriptedHost {
    /// A host whose ports reply with `messages`.
    #[must_use]
    pub fn replying<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reply: messages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A host that fails every connection.
    #[must_use]
    pub fn failing(failure: ConnectFailure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Everything posted to any port, in order.
    #[must_use]
    pub fn posted(&self) -> Vec<String> {
        self.posted.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Application names passed to `connect`, in order.
    #[must_use]
    pub fn connects(&self) -> Vec<String> {
        self.connects.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of `connect` calls.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl NativeHost for ScriptedHost {
    async fn connect(&self, application: &str) -> ChannelResult<Box<dyn NativePort>> {
        if let Ok(mut guard) = self.connects.lock() {
            guard.push(application.to_owned());
        }
        match self.failure {
            Some(ConnectFailure::NotRegistered) => Err(ChannelError::NotRegistered {
                application: application.to_owned(),
                searched: Vec::new(),
            }),
            Some(ConnectFailure::ExecutableMissing) => Err(ChannelError::ExecutableMissing(
                format!("/nonexistent/{application}").into(),
            )),
            Some(ConnectFailure::PermissionDenied) => Err(ChannelError::PermissionDenied(
                format!("/opt/{application}").into(),
            )),
            None => Ok(Box::new(ScriptedPort {
                posted: Arc::clone(&self.posted),
                reply: self.reply.iter().cloned().collect(),
                closed: false,
            })),
        }
    }
}

/// Port handed out by [`ScriptedHost`].
#[derive(Debug)]
pub struct ScriptedPort {
    posted: Arc<Mutex<Vec<String>>>,
    reply: VecDeque<String>,
    closed: bool,
}

#[async_trait]
impl NativePort for ScriptedPort {
    async fn post(&mut self, text: &str) -> ChannelResult<()> {
        if self.closed {
            return Err(ChannelError::Disconnected);
        }
        if let Ok(mut guard) = self.posted.lock() {
            guard.push(text.to_owned());
        }
        Ok(())
    }

    async fn next_message(&mut self) -> Option<ChannelResult<String>> {
        self.reply.pop_front().map(Ok)
    }

    async fn close(&mut self) -> ChannelResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_surface_round_trip() {
        let surface = MockComposeSurface::new().with_plain("t1", "Hello");
        let target = ComposeTarget::new("t1");

        let details = surface.get_plain_text_body(&target).await.unwrap();
        assert!(details.is_plain_text);
        surface.set_plain_text_body(&target, "Bye").await.unwrap();

        assert_eq!(surface.body("t1").as_deref(), Some("Bye"));
        assert_eq!(surface.write_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_surface_unknown_target() {
        let surface = MockComposeSurface::new();
        let target = ComposeTarget::new("missing");
        assert!(surface.get_plain_text_body(&target).await.is_err());
        assert!(surface.set_plain_text_body(&target, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_surface_captures_errors() {
        let surface = MockComposeSurface::new();
        surface.show_error(None, "boom");
        assert_eq!(surface.get_error_messages(), vec!["boom".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_host_replays() {
        let host = ScriptedHost::replying(["a", "b"]);
        let mut port = host.connect("tbed").await.unwrap();
        port.post("hello").await.unwrap();

        assert_eq!(port.next_message().await.unwrap().unwrap(), "a");
        assert_eq!(port.next_message().await.unwrap().unwrap(), "b");
        assert!(port.next_message().await.is_none());
        assert_eq!(host.posted(), vec!["hello".to_string()]);
        assert_eq!(host.connects(), vec!["tbed".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_host_failure() {
        let host = ScriptedHost::failing(ConnectFailure::ExecutableMissing);
        assert!(matches!(
            host.connect("tbed").await,
            Err(ChannelError::ExecutableMissing(_))
        ));
        assert_eq!(host.connect_count(), 1);
    }
}
