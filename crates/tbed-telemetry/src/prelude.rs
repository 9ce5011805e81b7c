//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tbed_telemetry::prelude::*;` to import all essential types.

// Errors
pub use crate::{TelemetryError, TelemetryResult};

// Logging configuration
pub use crate::{LogConfig, LogFormat, LogTarget};

// Setup
pub use crate::setup_logging;

// Session context
pub use crate::{SessionContext, SessionGuard};
