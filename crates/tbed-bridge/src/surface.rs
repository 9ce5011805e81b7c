//! The composition surface the bridge reads drafts from and writes them to.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SurfaceResult;

/// Handle of one compose tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComposeTarget(String);

impl ComposeTarget {
    /// Wrap a surface-specific handle.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComposeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComposeTarget {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The current body of a compose tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeDetails {
    /// Whether the draft is plain text.
    pub is_plain_text: bool,
    /// Plain-text rendering of the body.
    pub plain_text_body: String,
}

impl ComposeDetails {
    /// A plain-text draft.
    #[must_use]
    pub fn plain(body: impl Into<String>) -> Self {
        Self {
            is_plain_text: true,
            plain_text_body: body.into(),
        }
    }

    /// A rich (HTML) draft.
    #[must_use]
    pub fn rich(body: impl Into<String>) -> Self {
        Self {
            is_plain_text: false,
            plain_text_body: body.into(),
        }
    }
}

/// A compose window and its tabs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComposeWindow {
    /// Tabs in the window.
    pub tabs: Vec<ComposeTarget>,
}

impl ComposeWindow {
    /// A window with the given tabs.
    #[must_use]
    pub fn new(tabs: Vec<ComposeTarget>) -> Self {
        Self { tabs }
    }

    /// The only tab, if there is exactly one.
    #[must_use]
    pub fn single_tab(&self) -> Option<&ComposeTarget> {
        match self.tabs.as_slice() {
            [tab] => Some(tab),
            _ => None,
        }
    }
}

/// Read/write access to compose tabs.
#[async_trait]
pub trait ComposeSurface: Send + Sync {
    /// Current body of `target`.
    async fn get_plain_text_body(&self, target: &ComposeTarget) -> SurfaceResult<ComposeDetails>;

    /// Replace the body of `target`.
    async fn set_plain_text_body(&self, target: &ComposeTarget, body: &str) -> SurfaceResult<()>;

    /// The focused compose window, if any.
    async fn focused_window(&self) -> SurfaceResult<Option<ComposeWindow>>;

    /// Show an error to the user.
    fn show_error(&self, _target: Option<&ComposeTarget>, _message: &str) {}
}
