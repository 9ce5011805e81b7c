//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tbed_protocol::prelude::*;` to import all essential types.

// Errors
pub use crate::{ProtocolError, ProtocolResult};

// Framing
pub use crate::{Framer, Message, MessageKind, TBED_HEADER};

// Paging
pub use crate::{PagerState, ReassemblyBuffer, paginate};

// Transport frames
pub use crate::{encode_frame, read_frame, write_frame};

// Limits
pub use crate::{MAX_INBOUND_LEN, MAX_OUTBOUND_LEN};
