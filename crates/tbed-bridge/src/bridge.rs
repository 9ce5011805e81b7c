//! The Bridge Orchestrator.
//!
//! One [`Bridge::edit`] call is one session: read the draft, open a
//! [`Channel`], send the editor command and the draft, wait for the full
//! reply and write it back to the same compose target.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tbed_config::{BridgeConfig, ConfigStore};
use tbed_protocol::ReassemblyBuffer;
use tbed_telemetry::SessionContext;
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

use crate::channel::{Channel, Response};
use crate::error::{BridgeError, BridgeResult};
use crate::event::UiEvent;
use crate::surface::{ComposeSurface, ComposeTarget};
use crate::transport::NativeHost;

/// Summary of a completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// The target that was edited.
    pub target: ComposeTarget,
    /// Session id, as logged.
    pub session: Uuid,
    /// Draft bytes sent.
    pub bytes_sent: u64,
    /// Message bytes received from the native application.
    pub bytes_received: u64,
    /// Continuation pages in the reply.
    pub pages: u32,
}

/// Drives edit sessions between a compose surface and a native host.
pub struct Bridge {
    surface: Arc<dyn ComposeSurface>,
    host: Arc<dyn NativeHost>,
    store: Arc<dyn ConfigStore>,
    config: BridgeConfig,
    active: Mutex<HashSet<ComposeTarget>>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Lock the active-session set, recovering it if a holder panicked.
fn lock_active(active: &Mutex<HashSet<ComposeTarget>>) -> MutexGuard<'_, HashSet<ComposeTarget>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a target busy until dropped.
struct ActiveSession<'a> {
    active: &'a Mutex<HashSet<ComposeTarget>>,
    target: ComposeTarget,
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        lock_active(self.active).remove(&self.target);
    }
}

impl Bridge {
    /// Create a bridge.
    #[must_use]
    pub fn new(
        surface: Arc<dyn ComposeSurface>,
        host: Arc<dyn NativeHost>,
        store: Arc<dyn ConfigStore>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            surface,
            host,
            store,
            config,
            active: Mutex::new(HashSet::new()),
        }
    }

    /// Channel settings in use.
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Whether a session for `target` is running.
    #[must_use]
    pub fn is_active(&self, target: &ComposeTarget) -> bool {
        lock_active(&self.active).contains(target)
    }

    /// Handle a UI event.
    ///
    /// Returns `Ok(None)` for keyboard commands other than the configured
    /// hotkey.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::AmbiguousTarget`] when a hotkey fires without
    /// exactly one focused compose tab, or any error from [`Bridge::edit`].
    pub async fn handle_event(&self, event: UiEvent) -> BridgeResult<Option<EditOutcome>> {
        let trigger = event.trigger();
        let target = match event {
            UiEvent::ButtonClicked(target) => target,
            UiEvent::Command(name) => {
                if name != self.config.hotkey_command {
                    debug!(command = %name, "Ignoring unrelated command");
                    return Ok(None);
                }
                match self.resolve_focused_target().await {
                    Ok(target) => target,
                    Err(e) => {
                        self.report(None, &e);
                        return Err(e);
                    },
                }
            },
        };
        self.run(target, trigger).await.map(Some)
    }

    /// Run one edit session for `target`.
    ///
    /// The target body is only written on success.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SessionActive`] if `target` is already being
    /// edited, [`BridgeError::UnsupportedContent`] for non plain-text drafts,
    /// and the channel, protocol, surface or config error that ended the
    /// session otherwise.
    pub async fn edit(&self, target: ComposeTarget) -> BridgeResult<EditOutcome> {
        self.run(target, "direct").await
    }

    async fn run(&self, target: ComposeTarget, trigger: &str) -> BridgeResult<EditOutcome> {
        let _active = match self.claim(&target) {
            Ok(guard) => guard,
            Err(e) => {
                self.report(Some(&target), &e);
                return Err(e);
            },
        };

        let ctx = SessionContext::new(target.as_str())
            .with_application(self.config.application.clone())
            .with_trigger(trigger);
        let session = ctx.session_id;
        let span = ctx.span();

        let result = self
            .session(&target, session)
            .instrument(span.clone())
            .await;
        if let Err(e) = &result {
            let _entered = span.enter();
            self.report(Some(&target), e);
        }
        result
    }

    fn claim(&self, target: &ComposeTarget) -> BridgeResult<ActiveSession<'_>> {
        let mut active = lock_active(&self.active);
        if !active.insert(target.clone()) {
            return Err(BridgeError::SessionActive {
                target: target.clone(),
            });
        }
        Ok(ActiveSession {
            active: &self.active,
            target: target.clone(),
        })
    }

    async fn session(&self, target: &ComposeTarget, session: Uuid) -> BridgeResult<EditOutcome> {
        let details = self.surface.get_plain_text_body(target).await?;
        if !details.is_plain_text {
            return Err(BridgeError::UnsupportedContent {
                target: target.clone(),
            });
        }
        let editor = self.store.get().await?;
        debug!(command = %editor.command, len = details.plain_text_body.len(), "Draft ready");

        let mut channel = Channel::open(self.host.as_ref(), &self.config.application)
            .await?
            .with_outbound_limit(self.config.outbound_limit);

        // The reply is written back before closing; closing may wait on the native process.
        let written = async {
            let response =
                Self::exchange(&mut channel, &editor.command, &details.plain_text_body).await?;
            self.surface
                .set_plain_text_body(target, &response.text)
                .await?;
            Ok::<_, BridgeError>(response)
        }
        .await;
        let bytes_sent = channel.bytes_sent();
        let bytes_received = channel.bytes_received();
        if let Err(e) = channel.close().await {
            warn!(error = %e, "Failed to close channel");
        }
        let response = written?;

        info!(
            bytes_sent,
            bytes_received,
            pages = response.pages,
            "Draft replaced with edited text"
        );

        Ok(EditOutcome {
            target: target.clone(),
            session,
            bytes_sent,
            bytes_received,
            pages: response.pages,
        })
    }

    async fn exchange(channel: &mut Channel, command: &str, draft: &str) -> BridgeResult<Response> {
        channel.send(command, draft).await?;
        let mut buffer = ReassemblyBuffer::new();
        Ok(channel.receive_response(&mut buffer).await?)
    }

    async fn resolve_focused_target(&self) -> BridgeResult<ComposeTarget> {
        let window = self.surface.focused_window().await?;
        let Some(window) = window else {
            return Err(BridgeError::AmbiguousTarget { tabs: 0 });
        };
        window
            .single_tab()
            .cloned()
            .ok_or(BridgeError::AmbiguousTarget {
                tabs: window.tabs.len(),
            })
    }

    fn report(&self, target: Option<&ComposeTarget>, err: &BridgeError) {
        error!(compose = target.map(ComposeTarget::as_str), error = %err, "Edit session failed");
        self.surface.show_error(target, &err.to_string());
    }
}
