//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tbed_bridge::prelude::*;` to import all essential types.

// Errors
pub use crate::{
    BridgeError, BridgeResult, ChannelError, ChannelResult, SurfaceError, SurfaceResult,
};

// Orchestration
pub use crate::{Bridge, EditOutcome, UiEvent};

// Channel and transport
pub use crate::{Channel, ChannelState, NativeHost, NativePort, ProcessHost, Response, StdioPort};

// Compose surface
pub use crate::{ComposeDetails, ComposeSurface, ComposeTarget, ComposeWindow};
