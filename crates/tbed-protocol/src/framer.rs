//! Control-message framing.
//!
//! Control messages start with a delimiter line and carry a single
//! `Label: value` body:
//!
//! ```text
//! --tbed-hdr
//! Command: /usr/bin/vim -f
//! ```
//!
//! Anything without the delimiter line is plain text.

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{Message, MessageKind};

/// Default header delimiter.
pub const TBED_HEADER: &str = "--tbed-hdr";

const COMMAND_LABEL: &str = "Command: ";
const PAGES_LABEL: &str = "Pages: ";

/// Longest slice of an unrecognized control message echoed into errors.
const CONTROL_PREVIEW_LEN: usize = 64;

/// Builds and recognizes control messages for one delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framer {
    /// Delimiter followed by `\n`.
    header_line: String,
}

impl Default for Framer {
    fn default() -> Self {
        Self::new(TBED_HEADER)
    }
}

impl Framer {
    /// Create a framer for a custom delimiter.
    #[must_use]
    pub fn new(delimiter: impl Into<String>) -> Self {
        let mut header_line = delimiter.into();
        header_line.push('\n');
        Self { header_line }
    }

    /// The delimiter, without the trailing newline.
    #[must_use]
    pub fn delimiter(&self) -> &str {
        self.header_line.trim_end_matches('\n')
    }

    /// Whether `text` begins with the delimiter line.
    #[must_use]
    pub fn is_control_message(&self, text: &str) -> bool {
        text.starts_with(&self.header_line)
    }

    /// The body of a control message (everything after the delimiter line).
    #[must_use]
    pub fn control_body<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.header_line.as_str())
    }

    /// Extract the page count from a `Pages: <N>` control message.
    ///
    /// Returns `Ok(None)` when `text` is not a page announcement (plain text or
    /// another control message).
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPageCount`] when the label is present
    /// but is not followed by a decimal count that fits in a `u32`.
    pub fn parse_page_announcement(&self, text: &str) -> ProtocolResult<Option<u32>> {
        let Some(raw) = self
            .control_body(text)
            .and_then(|body| body.strip_prefix(PAGES_LABEL))
        else {
            return Ok(None);
        };

        let digits = raw.trim_end();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::MalformedPageCount {
                raw: raw.to_owned(),
            });
        }

        digits
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ProtocolError::MalformedPageCount {
                raw: raw.to_owned(),
            })
    }

    /// Extract the editor command from a `Command: <cmd>` control message.
    #[must_use]
    pub fn parse_command<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.control_body(text)
            .and_then(|body| body.strip_prefix(COMMAND_LABEL))
    }

    /// Build the command message that opens every session.
    #[must_use]
    pub fn build_command_message(&self, command: &str) -> Message {
        Message::new(
            MessageKind::Command,
            format!("{}{COMMAND_LABEL}{command}", self.header_line),
        )
    }

    /// Build a `Pages: <N>` announcement.
    #[must_use]
    pub fn build_page_announcement(&self, pages: u32) -> Message {
        Message::new(
            MessageKind::PageAnnouncement,
            format!("{}{PAGES_LABEL}{pages}", self.header_line),
        )
    }

    /// Classify raw wire text.
    ///
    /// Plain text always decodes as [`MessageKind::Payload`]; whether it is a
    /// continuation depends on reassembly state, not on the text.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MalformedPageCount`] for a broken announcement
    /// and [`ProtocolError::UnexpectedControl`] for an unknown control label.
    pub fn decode(&self, text: String) -> ProtocolResult<Message> {
        if !self.is_control_message(&text) {
            return Ok(Message::payload(text));
        }
        if self.parse_page_announcement(&text)?.is_some() {
            return Ok(Message::new(MessageKind::PageAnnouncement, text));
        }
        if self.parse_command(&text).is_some() {
            return Ok(Message::new(MessageKind::Command, text));
        }
        Err(ProtocolError::UnexpectedControl(self.preview(&text)))
    }

    /// Short single-line rendering of a control message for diagnostics.
    pub(crate) fn preview(&self, text: &str) -> String {
        let body = self.control_body(text).unwrap_or(text);
        let end = body
            .char_indices()
            .nth(CONTROL_PREVIEW_LEN)
            .map_or(body.len(), |(idx, _)| idx);
        body.get(..end).unwrap_or(body).replace('\n', "\\n")
    }
}
