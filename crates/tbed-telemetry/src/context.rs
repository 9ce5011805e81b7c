//! Per-session context for correlating log lines.

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Identity of one edit session.
///
/// Everything logged between sending a draft and replacing it with the
/// edited text happens inside [`SessionContext::span`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique session identifier.
    pub session_id: Uuid,
    /// The compose target being edited.
    pub target: String,
    /// Native application name, once known.
    pub application: Option<String>,
    /// How the session was started (`button`, `hotkey`, `cli`).
    pub trigger: Option<String>,
    started_at: Instant,
}

impl SessionContext {
    /// Create a context for `target` with a fresh session id.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            target: target.into(),
            application: None,
            trigger: None,
            started_at: Instant::now(),
        }
    }

    /// Set the native application name.
    #[must_use]
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Set what triggered the session.
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Time since the session started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Elapsed time in whole milliseconds, saturating.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// First eight characters of the session id.
    #[must_use]
    pub fn short_id(&self) -> String {
        self.session_id.simple().to_string().chars().take(8).collect()
    }

    /// A tracing span carrying this context.
    #[must_use]
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "session",
            session = %self.session_id,
            compose = %self.target,
            application = self.application.as_deref(),
            trigger = self.trigger.as_deref(),
        )
    }

    /// Enter the span until the returned guard is dropped.
    #[must_use]
    pub fn enter(self) -> SessionGuard {
        SessionGuard::new(self)
    }
}

/// Guard that keeps a session span entered and logs when it ends.
///
/// Holds an entered span, so it must not be kept across `.await` points;
/// async code should use `tracing::Instrument` with [`SessionContext::span`].
pub struct SessionGuard {
    context: SessionContext,
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl SessionGuard {
    /// Enter `context`'s span.
    #[must_use]
    pub fn new(context: SessionContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Session started");
        Self { context, span }
    }

    /// The session context.
    #[must_use]
    pub fn context(&self) -> &SessionContext {
        &self.context
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "Session ended");
    }
}
