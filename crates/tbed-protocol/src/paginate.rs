//! Splitting a response into pages.
//!
//! This is the native-application side of paging: a reply whose JSON
//! encoding exceeds the inbound frame ceiling is sent as
//! `[Pages: k, page_1, .., page_k, terminal]`, which [`ReassemblyBuffer`]
//! flattens back into the original text.
//!
//! [`ReassemblyBuffer`]: crate::ReassemblyBuffer

use crate::error::{ProtocolError, ProtocolResult};
use crate::framer::Framer;
use crate::message::Message;

/// The two quote characters around every JSON string.
const QUOTES: usize = 2;

/// Longest JSON escape for a single character (`\u001f`).
const MAX_ESCAPE_LEN: usize = 6;

/// Encoded size of `c` inside a JSON string.
fn json_char_len(c: char) -> usize {
    match c {
        '"' | '\\' | '\n' | '\r' | '\t' | '\u{8}' | '\u{c}' => 2,
        c if c < '\u{20}' => MAX_ESCAPE_LEN,
        c => c.len_utf8(),
    }
}

fn encoded_len(text: &str) -> usize {
    text.chars()
        .fold(QUOTES, |acc, c| acc.saturating_add(json_char_len(c)))
}

/// Split `text` into the messages a native application sends back.
///
/// Every returned message encodes to at most `max_page_bytes` bytes of JSON.
/// Pages break on `char` boundaries only.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidPageSize`] if `max_page_bytes` cannot hold
/// a single escaped character or the page announcement itself.
pub fn paginate(framer: &Framer, text: &str, max_page_bytes: usize) -> ProtocolResult<Vec<Message>> {
    if encoded_len(text) <= max_page_bytes {
        return Ok(vec![Message::payload(text)]);
    }

    let budget = max_page_bytes
        .checked_sub(QUOTES)
        .filter(|b| *b >= MAX_ESCAPE_LEN)
        .ok_or(ProtocolError::InvalidPageSize(max_page_bytes))?;

    let mut pages: Vec<&str> = Vec::new();
    let mut start = 0usize;
    let mut used = 0usize;
    for (idx, c) in text.char_indices() {
        let width = json_char_len(c);
        if used.saturating_add(width) > budget {
            pages.push(&text[start..idx]);
            start = idx;
            used = 0;
        }
        used = used.saturating_add(width);
    }
    pages.push(&text[start..]);

    let Some((terminal, continuations)) = pages.split_last() else {
        return Ok(vec![Message::payload(text)]);
    };
    let count = u32::try_from(continuations.len())
        .map_err(|_| ProtocolError::InvalidPageSize(max_page_bytes))?;

    let announcement = framer.build_page_announcement(count);
    if encoded_len(announcement.body()) > max_page_bytes {
        return Err(ProtocolError::InvalidPageSize(max_page_bytes));
    }

    let mut messages = Vec::with_capacity(pages.len().saturating_add(1));
    messages.push(announcement);
    messages.extend(continuations.iter().map(|page| Message::continuation(*page)));
    messages.push(Message::payload(*terminal));
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use crate::pager::ReassemblyBuffer;

    fn reassemble(messages: Vec<Message>) -> Vec<String> {
        let mut buffer = ReassemblyBuffer::new();
        messages
            .into_iter()
            .filter_map(|m| buffer.push(m.into_body()).unwrap())
            .collect()
    }

    #[test]
    fn test_small_text_is_single_payload() {
        let messages = paginate(&Framer::default(), "short", 64).unwrap();
        assert_eq!(messages, vec![Message::payload("short")]);
    }

    #[test]
    fn test_large_text_is_announced() {
        let text = "a".repeat(100);
        let messages = paginate(&Framer::default(), &text, 42).unwrap();

        assert_eq!(messages[0].kind(), MessageKind::PageAnnouncement);
        assert_eq!(messages[0].body(), "--tbed-hdr\nPages: 2");
        assert_eq!(messages[1].kind(), MessageKind::Continuation);
        assert_eq!(messages[1].len(), 40);
        assert_eq!(messages.last().unwrap().kind(), MessageKind::Payload);
        assert_eq!(reassemble(messages), vec![text]);
    }

    #[test]
    fn test_pages_respect_encoded_size() {
        let text = "line \"one\"\nline\ttwo\u{1}ünïcödé ✓ ".repeat(20);
        let messages = paginate(&Framer::default(), &text, 40).unwrap();
        for message in &messages {
            let encoded = serde_json::to_string(message.body()).unwrap();
            assert!(encoded.len() <= 40, "page too large: {}", encoded.len());
        }
        assert_eq!(reassemble(messages), vec![text]);
    }

    #[test]
    fn test_page_starting_with_delimiter_round_trips() {
        let text = format!("{}--tbed-hdr\nSigned-off{}", "a".repeat(40), "b".repeat(60));
        let messages = paginate(&Framer::default(), &text, 42).unwrap();

        assert!(messages[2].body().starts_with("--tbed-hdr\n"));
        assert_eq!(reassemble(messages), vec![text]);
    }

    #[test]
    fn test_short_text_quoting_the_delimiter_round_trips() {
        let text = "--tbed-hdr\nquoted header";
        let messages = paginate(&Framer::default(), text, 64).unwrap();
        assert_eq!(reassemble(messages), vec![text.to_owned()]);
    }

    #[test]
    fn test_page_size_too_small() {
        let text = "x".repeat(50);
        assert!(matches!(
            paginate(&Framer::default(), &text, 7),
            Err(ProtocolError::InvalidPageSize(7))
        ));
    }
}
