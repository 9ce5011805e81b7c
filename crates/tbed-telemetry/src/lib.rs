//! tbed Telemetry - Logging and session tracing for the tbed editor bridge.
//!
//! This crate provides:
//! - Logging setup with a choice of formats, to stderr or rolling files
//! - A per-session context whose span ties together everything logged while
//!   one draft is out for editing
//!
//! # Example
//!
//! ```rust,no_run
//! use tbed_telemetry::{LogConfig, LogFormat, SessionContext, setup_logging};
//!
//! # fn main() -> Result<(), tbed_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("tbed_protocol=trace");
//!
//! setup_logging(&config)?;
//!
//! let ctx = SessionContext::new("compose-7").with_application("tbed");
//! let _guard = ctx.enter();
//! tracing::info!("sending draft");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{SessionContext, SessionGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};
