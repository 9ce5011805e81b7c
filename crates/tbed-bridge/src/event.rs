//! UI events that start an edit session.

use crate::surface::ComposeTarget;

/// An event from the compose UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The toolbar button was clicked in `target`.
    ButtonClicked(ComposeTarget),
    /// A named keyboard command fired; the target is the focused window's
    /// only tab.
    Command(String),
}

impl UiEvent {
    /// Short trigger name for logs.
    #[must_use]
    pub fn trigger(&self) -> &'static str {
        match self {
            Self::ButtonClicked(_) => "button",
            Self::Command(_) => "hotkey",
        }
    }
}
