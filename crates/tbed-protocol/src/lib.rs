//! tbed Protocol - Wire format shared by the editor bridge and native hosts.
//!
//! This crate provides:
//! - The [`Framer`], which builds and recognizes `--tbed-hdr` control messages
//! - [`Message`] and [`MessageKind`], the application-level message unit
//! - The transport frame codec (4-byte native-endian length + JSON string)
//! - [`ReassemblyBuffer`], which flattens paged responses into one payload
//! - [`paginate`], the native-side counterpart that splits a large response
//!
//! # Example
//!
//! ```rust
//! use tbed_protocol::{Framer, ReassemblyBuffer};
//!
//! # fn main() -> Result<(), tbed_protocol::ProtocolError> {
//! let framer = Framer::default();
//! let mut buffer = ReassemblyBuffer::new();
//!
//! assert_eq!(buffer.push(framer.build_page_announcement(1).into_body())?, None);
//! assert_eq!(buffer.push("Hello ".to_owned())?, None);
//! assert_eq!(buffer.push("world".to_owned())?, Some("Hello world".to_owned()));
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

pub mod error;
pub mod frame;
pub mod framer;
pub mod message;
pub mod paginate;
pub mod pager;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{HEADER_LEN, encode_frame, read_frame, write_frame};
pub use framer::{Framer, TBED_HEADER};
pub use message::{Message, MessageKind};
pub use paginate::paginate;
pub use pager::{PagerState, ReassemblyBuffer};

/// Largest payload the bridge may hand to a native application.
///
/// This is the ceiling implied by the 4-byte length header of a transport
/// frame (4 GiB).
pub const MAX_OUTBOUND_LEN: u64 = 4_294_967_296;

/// Largest frame a native application may send back to the bridge (1 MiB).
pub const MAX_INBOUND_LEN: u32 = 1_048_576;
