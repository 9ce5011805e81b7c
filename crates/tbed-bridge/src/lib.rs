//! tbed Bridge - Connects a mail compose window to an external editor.
//!
//! This crate provides:
//! - [`NativeHost`] / [`NativePort`], the native-messaging transport seam,
//!   with [`ProcessHost`] spawning manifest-registered applications
//! - [`Channel`], which owns one connection, enforces the outbound size
//!   limit and sends the editor command ahead of the draft
//! - [`ComposeSurface`], the compose window seen from the bridge
//! - [`Bridge`], which runs an edit session end to end
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use tbed_bridge::{Bridge, ComposeSurface, ManifestRegistry, ProcessHost, UiEvent};
//! use tbed_config::{Config, FileConfigStore};
//!
//! # async fn run(surface: Arc<dyn ComposeSurface>) -> Result<(), Box<dyn std::error::Error>> {
//! let resolved = Config::load()?;
//! let bridge_config = resolved.config.bridge.clone();
//! let host = ProcessHost::new(ManifestRegistry::default(), bridge_config.extension_id.clone());
//!
//! let bridge = Bridge::new(
//!     surface,
//!     Arc::new(host),
//!     Arc::new(FileConfigStore::new(resolved.path)),
//!     bridge_config,
//! );
//! bridge.handle_event(UiEvent::Command("tbed".into())).await?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod prelude;

pub mod bridge;
pub mod channel;
pub mod error;
pub mod event;
pub mod manifest;
pub mod process;
pub mod surface;
pub mod transport;

pub use bridge::{Bridge, EditOutcome};
pub use channel::{Channel, ChannelState, Response};
pub use error::{
    BridgeError, BridgeResult, ChannelError, ChannelResult, SurfaceError, SurfaceResult,
};
pub use event::UiEvent;
pub use manifest::{HostManifest, ManifestRegistry, ResolvedManifest, default_manifest_dirs};
pub use process::ProcessHost;
pub use surface::{ComposeDetails, ComposeSurface, ComposeTarget, ComposeWindow};
pub use transport::{NativeHost, NativePort, StdioPort};
