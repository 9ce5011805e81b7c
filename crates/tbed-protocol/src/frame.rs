//! Transport frames.
//!
//! Each frame is a `u32` payload length in native byte order followed by the
//! JSON encoding of the message text:
//!
//! ```text
//! +-----------------------------+------------------------+
//! | Length (4 bytes, native)    | JSON string            |
//! +-----------------------------+------------------------+
//! ```

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{ProtocolError, ProtocolResult};

/// Size of the length prefix.
pub const HEADER_LEN: usize = 4;

/// Encode `text` into a complete frame.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] when the encoded payload does not
/// fit the 4-byte length prefix.
pub fn encode_frame(text: &str) -> ProtocolResult<Vec<u8>> {
    let payload = serde_json::to_vec(text)?;
    let len = u32::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLarge {
        len: u64::try_from(payload.len()).unwrap_or(u64::MAX),
        limit: u64::from(u32::MAX),
    })?;

    let mut frame = Vec::with_capacity(payload.len().saturating_add(HEADER_LEN));
    frame.extend_from_slice(&len.to_ne_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Write one frame and flush.
///
/// Returns the number of bytes written, header included.
///
/// # Errors
///
/// Returns an error if encoding fails or the writer fails.
pub async fn write_frame<W>(writer: &mut W, text: &str) -> ProtocolResult<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = encode_frame(text)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    trace!(len = frame.len(), "Frame written");
    Ok(frame.len())
}

/// Read one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly before a new frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Truncated`] if the stream ends inside a frame,
/// [`ProtocolError::FrameTooLarge`] if the declared length exceeds
/// `max_len`, and [`ProtocolError::InvalidPayload`] if the payload is not a
/// JSON string.
pub async fn read_frame<R>(reader: &mut R, max_len: u32) -> ProtocolResult<Option<String>>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut header = [0u8; HEADER_LEN];
    let mut filled = 0usize;
    while filled < HEADER_LEN {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::Truncated(format!(
                "stream ended after {filled} of {HEADER_LEN} header bytes"
            )));
        }
        filled = filled.saturating_add(n);
    }

    let len = u32::from_ne_bytes(header);
    if len > max_len {
        return Err(ProtocolError::FrameTooLarge {
            len: u64::from(len),
            limit: u64::from(max_len),
        });
    }

    let size = usize::try_from(len).map_err(|_| ProtocolError::FrameTooLarge {
        len: u64::from(len),
        limit: u64::from(max_len),
    })?;
    let mut payload = vec![0u8; size];
    reader.read_exact(&mut payload).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::Truncated(format!("stream ended inside a {len} byte payload"))
        } else {
            ProtocolError::Io(e)
        }
    })?;

    let text: String = serde_json::from_slice(&payload)?;
    trace!(len, "Frame read");
    Ok(Some(text))
}
