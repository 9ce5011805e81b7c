//! Test fixtures for common types.

use std::sync::Arc;

use tbed_bridge::{Bridge, NativeHost};
use tbed_config::{BridgeConfig, EditorConfig, MemoryConfigStore};
use tbed_protocol::Framer;

use crate::mocks::MockComposeSurface;

/// Create a configured editor command.
#[must_use]
pub fn test_editor_config() -> EditorConfig {
    EditorConfig::by_shell("/usr/bin/vim")
}

/// Create bridge settings with default limits.
#[must_use]
pub fn test_bridge_config() -> BridgeConfig {
    BridgeConfig::default()
}

/// The messages a native application sends for a reply split into `parts`.
///
/// More than one part yields a `Pages` announcement for the continuations
/// followed by the parts; the last part is the terminal message.
#[must_use]
pub fn paged_reply(parts: &[&str]) -> Vec<String> {
    let mut messages = Vec::with_capacity(parts.len().saturating_add(1));
    if let Some(continuations) = parts.len().checked_sub(1).filter(|n| *n > 0) {
        let pages = u32::try_from(continuations).unwrap_or(u32::MAX);
        messages.push(
            Framer::default()
                .build_page_announcement(pages)
                .into_body(),
        );
    }
    messages.extend(parts.iter().map(|p| (*p).to_owned()));
    messages
}

/// Create a bridge over `surface` and `host` with [`test_editor_config`].
#[must_use]
pub fn test_bridge<H>(surface: &MockComposeSurface, host: &H) -> Bridge
where
    H: NativeHost + Clone + 'static,
{
    test_bridge_with(surface, host, test_bridge_config())
}

/// Like [`test_bridge`], with explicit bridge settings.
#[must_use]
pub fn test_bridge_with<H>(surface: &MockComposeSurface, host: &H, config: BridgeConfig) -> Bridge
where
    H: NativeHost + Clone + 'static,
{
    Bridge::new(
        Arc::new(surface.clone()),
        Arc::new(host.clone()),
        Arc::new(MemoryConfigStore::new(test_editor_config())),
        config,
    )
}
