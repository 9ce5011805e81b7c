//! tbed Test - Shared test utilities for the tbed editor bridge.
//!
//! This crate provides mock implementations and test helpers that can be
//! used across tbed crates as a dev-dependency.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[cfg(test)]
//! mod tests {
//!     use std::sync::Arc;
//!     use tbed_test::{MockComposeSurface, ScriptedHost, paged_reply, test_bridge};
//!
//!     #[tokio::test]
//!     async fn test_paged_edit() {
//!         let surface = MockComposeSurface::new().with_plain("T1", "Hello world");
//!         let host = ScriptedHost::replying(paged_reply(&["Hel", "lo ", "world edited"]));
//!         let bridge = test_bridge(&surface, &host);
//!
//!         bridge.edit("T1".into()).await.unwrap();
//!         assert_eq!(surface.body("T1").as_deref(), Some("Hello world edited"));
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
