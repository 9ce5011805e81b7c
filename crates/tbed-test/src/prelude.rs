//! Prelude module - commonly used test helpers.

pub use crate::{
    LoopbackHost, MockComposeSurface, ScriptedHost, init_test_logging, paged_reply,
    test_bridge, test_bridge_config, test_bridge_with, test_editor_config,
};
