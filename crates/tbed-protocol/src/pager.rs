//! Reassembly of paged responses.
//!
//! A native application that needs more than one frame for its reply first
//! sends a `Pages: <N>` announcement, then `N` continuation messages, then one
//! terminal message. A reply that fits in one frame is just the terminal
//! message. [`ReassemblyBuffer::push`] consumes messages in arrival order and
//! yields the flattened text exactly once per response cycle.
//!
//! # Ordering
//!
//! The buffer relies on the transport delivering messages in the order the
//! native application wrote them. It has no sequence numbers and cannot
//! detect or repair reordering; out-of-order parts are concatenated in the
//! order they are pushed.

use tracing::{debug, trace, warn};

use crate::error::{ProtocolError, ProtocolResult};
use crate::framer::Framer;

/// Position of a [`ReassemblyBuffer`] within one response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PagerState {
    /// Nothing received for the current cycle.
    #[default]
    Idle,
    /// A page announcement was seen; no continuation consumed yet.
    AwaitingPages,
    /// At least one continuation has been consumed.
    Collecting,
    /// The terminal message was delivered.
    Complete,
}

/// Accumulates the parts of one response.
///
/// Invariant: `parts` is only flushed when `pending_pages` is zero, and is
/// empty whenever a new cycle starts.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    framer: Framer,
    state: PagerState,
    pending_pages: u32,
    parts: Vec<String>,
    cycles: u64,
}

impl ReassemblyBuffer {
    /// Create an empty buffer using the default delimiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer that recognizes control messages with `framer`.
    #[must_use]
    pub fn with_framer(framer: Framer) -> Self {
        Self {
            framer,
            ..Self::default()
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PagerState {
        self.state
    }

    /// Continuation messages still expected.
    #[must_use]
    pub fn pending_pages(&self) -> u32 {
        self.pending_pages
    }

    /// Number of parts held for the current cycle.
    #[must_use]
    pub fn buffered_parts(&self) -> usize {
        self.parts.len()
    }

    /// Number of completed cycles since creation.
    #[must_use]
    pub fn completed_cycles(&self) -> u64 {
        self.cycles
    }

    /// Drop any partial state and return to [`PagerState::Idle`].
    pub fn reset(&mut self) {
        self.state = PagerState::Idle;
        self.pending_pages = 0;
        self.parts.clear();
    }

    /// Feed the next inbound message.
    ///
    /// Returns `Ok(Some(text))` when `text` completes the response, and
    /// `Ok(None)` while more messages are needed. Pushing after completion
    /// starts a new cycle.
    ///
    /// While continuations are pending every message is a page, whatever it
    /// starts with; only a second page announcement is refused. Outside a
    /// paged cycle a page announcement opens one (a malformed count is logged
    /// and dropped), and any other text, delimiter-prefixed or not, is the
    /// terminal message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedAnnouncement`] when an announcement
    /// arrives after the cycle already started, and
    /// [`ProtocolError::UnexpectedControl`] when an outbound `Command:` header
    /// is echoed back in place of a reply.
    pub fn push(&mut self, text: String) -> ProtocolResult<Option<String>> {
        if self.state == PagerState::Complete {
            self.reset();
        }

        if self.pending_pages > 0 {
            if let Ok(Some(announced)) = self.framer.parse_page_announcement(&text) {
                return Err(ProtocolError::UnexpectedAnnouncement {
                    pending: self.pending_pages,
                    announced,
                });
            }
            self.pending_pages = self.pending_pages.saturating_sub(1);
            trace!(
                len = text.len(),
                pending = self.pending_pages,
                "Buffered continuation page"
            );
            self.parts.push(text);
            self.state = PagerState::Collecting;
            return Ok(None);
        }

        if self.framer.is_control_message(&text) && self.accept_control(&text)? {
            return Ok(None);
        }

        let result = self.flush(text);
        self.state = PagerState::Complete;
        self.cycles = self.cycles.saturating_add(1);
        debug!(len = result.len(), "Response reassembled");
        Ok(Some(result))
    }

    /// Handle a delimiter-prefixed message outside a paged cycle. Returns
    /// `false` when the message is ordinary reply text.
    fn accept_control(&mut self, text: &str) -> ProtocolResult<bool> {
        match self.framer.parse_page_announcement(text) {
            Ok(Some(pages)) => {
                if self.state != PagerState::Idle {
                    return Err(ProtocolError::UnexpectedAnnouncement {
                        pending: self.pending_pages,
                        announced: pages,
                    });
                }
                debug!(pages, "Paged response announced");
                self.pending_pages = pages;
                self.state = PagerState::AwaitingPages;
                Ok(true)
            },
            Ok(None) if self.framer.parse_command(text).is_some() => {
                Err(ProtocolError::UnexpectedControl(self.framer.preview(text)))
            },
            Ok(None) => Ok(false),
            Err(e) => {
                warn!(error = %e, "Dropping malformed page announcement");
                Ok(true)
            },
        }
    }

    /// Concatenate buffered parts followed by the terminal text.
    fn flush(&mut self, terminal: String) -> String {
        if self.parts.is_empty() {
            return terminal;
        }
        let capacity = self
            .parts
            .iter()
            .fold(terminal.len(), |acc, part| acc.saturating_add(part.len()));
        let mut joined = String::with_capacity(capacity);
        for part in self.parts.drain(..) {
            joined.push_str(&part);
        }
        joined.push_str(&terminal);
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn announce(pages: u32) -> String {
        Framer::default().build_page_announcement(pages).into_body()
    }

    /// Push every message, collecting emissions.
    fn feed(buffer: &mut ReassemblyBuffer, messages: &[&str]) -> Vec<String> {
        messages
            .iter()
            .filter_map(|m| buffer.push((*m).to_owned()).unwrap())
            .collect()
    }

    #[test]
    fn test_single_message_passthrough() {
        let mut buffer = ReassemblyBuffer::new();
        assert_eq!(feed(&mut buffer, &["Hello world"]), vec!["Hello world"]);
        assert_eq!(buffer.state(), PagerState::Complete);
        assert_eq!(buffer.completed_cycles(), 1);
    }

    #[test]
    fn test_paged_response_concatenates_in_order() {
        let mut buffer = ReassemblyBuffer::new();
        let ann = announce(2);
        let out = feed(&mut buffer, &[ann.as_str(), "Hel", "lo ", "world edited"]);
        assert_eq!(out, vec!["Hello world edited"]);
        assert_eq!(buffer.buffered_parts(), 0);
    }

    #[test]
    fn test_states_through_cycle() {
        let mut buffer = ReassemblyBuffer::new();
        assert_eq!(buffer.state(), PagerState::Idle);

        assert!(buffer.push(announce(2)).unwrap().is_none());
        assert_eq!(buffer.state(), PagerState::AwaitingPages);
        assert_eq!(buffer.pending_pages(), 2);

        assert!(buffer.push("a".to_owned()).unwrap().is_none());
        assert_eq!(buffer.state(), PagerState::Collecting);
        assert_eq!(buffer.pending_pages(), 1);

        assert!(buffer.push("b".to_owned()).unwrap().is_none());
        assert_eq!(buffer.pending_pages(), 0);

        assert_eq!(buffer.push("c".to_owned()).unwrap().as_deref(), Some("abc"));
        assert_eq!(buffer.state(), PagerState::Complete);
    }

    #[test]
    fn test_zero_pages_is_passthrough() {
        let mut buffer = ReassemblyBuffer::new();
        let ann = announce(0);
        assert_eq!(feed(&mut buffer, &[ann.as_str(), "final"]), vec!["final"]);
    }

    #[test]
    fn test_new_cycle_after_completion() {
        let mut buffer = ReassemblyBuffer::new();
        let ann = announce(1);
        assert_eq!(feed(&mut buffer, &[ann.as_str(), "a", "b"]), vec!["ab"]);
        assert_eq!(feed(&mut buffer, &["c"]), vec!["c"]);
        assert_eq!(feed(&mut buffer, &[ann.as_str(), "d", "e"]), vec!["de"]);
        assert_eq!(buffer.completed_cycles(), 3);
    }

    #[test]
    fn test_duplicate_announcement_is_rejected() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.push(announce(2)).unwrap();
        buffer.push("a".to_owned()).unwrap();
        let err = buffer.push(announce(3)).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnexpectedAnnouncement {
                pending: 1,
                announced: 3
            }
        ));
    }

    #[test]
    fn test_announcement_after_zero_announcement_is_rejected() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.push(announce(0)).unwrap();
        assert!(matches!(
            buffer.push(announce(1)),
            Err(ProtocolError::UnexpectedAnnouncement { .. })
        ));
    }

    #[test]
    fn test_malformed_announcement_is_dropped() {
        let mut buffer = ReassemblyBuffer::new();
        assert!(buffer.push("--tbed-hdr\nPages: lots".to_owned()).unwrap().is_none());
        assert_eq!(buffer.state(), PagerState::Idle);
        assert_eq!(feed(&mut buffer, &["text"]), vec!["text"]);
    }

    #[test]
    fn test_echoed_command_is_rejected() {
        let mut buffer = ReassemblyBuffer::new();
        assert!(matches!(
            buffer.push("--tbed-hdr\nCommand: vi".to_owned()),
            Err(ProtocolError::UnexpectedControl(_))
        ));
    }

    #[test]
    fn test_delimiter_prefixed_reply_is_delivered() {
        let mut buffer = ReassemblyBuffer::new();
        assert_eq!(
            feed(&mut buffer, &["--tbed-hdr\nnotes about tbed"]),
            vec!["--tbed-hdr\nnotes about tbed"]
        );
        assert_eq!(buffer.state(), PagerState::Complete);
    }

    #[test]
    fn test_delimiter_prefixed_continuations_are_pages() {
        let mut buffer = ReassemblyBuffer::new();
        let ann = announce(3);
        let out = feed(
            &mut buffer,
            &[
                ann.as_str(),
                "--tbed-hdr\nSigned-off",
                "--tbed-hdr\nPages: lots",
                "--tbed-hdr\nCommand: vi",
                "--tbed-hdr\nend",
            ],
        );
        assert_eq!(
            out,
            vec!["--tbed-hdr\nSigned-off--tbed-hdr\nPages: lots--tbed-hdr\nCommand: vi--tbed-hdr\nend"]
        );
    }

    #[test]
    fn test_reordered_parts_are_not_repaired() {
        let mut buffer = ReassemblyBuffer::new();
        let ann = announce(2);
        let out = feed(&mut buffer, &[ann.as_str(), "lo ", "Hel", "world"]);
        assert_eq!(out, vec!["lo Helworld"]);
    }

    #[test]
    fn test_reset_discards_partial_cycle() {
        let mut buffer = ReassemblyBuffer::new();
        buffer.push(announce(3)).unwrap();
        buffer.push("a".to_owned()).unwrap();
        buffer.reset();
        assert_eq!(buffer.pending_pages(), 0);
        assert_eq!(buffer.buffered_parts(), 0);
        assert_eq!(feed(&mut buffer, &["z"]), vec!["z"]);
    }
}
