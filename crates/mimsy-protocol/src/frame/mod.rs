//! Length-prefixed framing.
//!
//! Every frame is a 4-byte big-endian unsigned payload length followed by
//! exactly that many payload bytes. Readers only hand a payload upward once
//! the prefix and every payload byte have arrived; short reads from the
//! stream are retried until the frame is complete.

use std::io::{Read, Write};

use tracing::trace;

use crate::error::WireError;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Tracing target for frame-level I/O.
const FRAME_TARGET: &str = "mimsy_protocol::frame";

/// Prepends the length prefix to `payload`.
///
/// # Errors
///
/// Returns [`WireError::FrameTooLarge`] when the payload does not fit the
/// 32-bit length field.
#[expect(
    clippy::big_endian_bytes,
    reason = "the host defines the length prefix as big-endian"
)]
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, WireError> {
    let len = u32::try_from(payload.len()).map_err(|_| WireError::FrameTooLarge {
        len: u64::try_from(payload.len()).unwrap_or(u64::MAX),
        max: u64::from(u32::MAX),
    })?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Splits a complete frame into its payload.
///
/// # Errors
///
/// Returns [`WireError::TruncatedFrame`] if the buffer is shorter than the
/// prefix or the declared length, and [`WireError::TrailingBytes`] if bytes
/// remain after the declared payload.
pub fn decode_frame(frame: &[u8]) -> Result<&[u8], WireError> {
    let Some((prefix, payload)) = frame.split_first_chunk::<LENGTH_PREFIX_LEN>() else {
        // The prefix itself is incomplete.
        return Err(WireError::TruncatedFrame {
            declared: LENGTH_PREFIX_LEN,
            available: frame.len(),
        });
    };
    let declared = declared_len(*prefix);
    match payload.len().cmp(&declared) {
        std::cmp::Ordering::Less => Err(WireError::TruncatedFrame {
            declared,
            available: payload.len(),
        }),
        std::cmp::Ordering::Greater => Err(WireError::TrailingBytes {
            declared,
            available: payload.len(),
        }),
        std::cmp::Ordering::Equal => Ok(payload),
    }
}

/// Reads one complete frame and returns its payload.
///
/// Blocks until the prefix and the full payload are available. A declared
/// length above `max_len` is rejected before any payload is read.
///
/// # Errors
///
/// Returns [`WireError::Io`] when the stream fails or closes before the frame
/// is complete, and [`WireError::FrameTooLarge`] for oversized frames.
#[expect(
    clippy::big_endian_bytes,
    reason = "the host defines the length prefix as big-endian"
)]
pub fn read_frame<R: Read>(reader: &mut R, max_len: u32) -> Result<Vec<u8>, WireError> {
    let mut prefix = [0_u8; LENGTH_PREFIX_LEN];
    reader.read_exact(&mut prefix).map_err(WireError::read)?;

    let declared = u32::from_be_bytes(prefix);
    if declared > max_len {
        return Err(WireError::FrameTooLarge {
            len: u64::from(declared),
            max: u64::from(max_len),
        });
    }

    let mut payload = vec![0_u8; declared_len(prefix)];
    reader.read_exact(&mut payload).map_err(WireError::read)?;

    trace!(target: FRAME_TARGET, frame_bytes = payload.len(), "read frame");
    Ok(payload)
}

/// Writes `payload` as one frame and flushes the stream.
///
/// # Errors
///
/// Returns [`WireError::FrameTooLarge`] if the payload cannot be framed and
/// [`WireError::Io`] if the stream rejects the write.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), WireError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).map_err(WireError::write)?;
    writer.flush().map_err(WireError::write)?;

    trace!(target: FRAME_TARGET, frame_bytes = payload.len(), "wrote frame");
    Ok(())
}

#[expect(
    clippy::big_endian_bytes,
    reason = "the host defines the length prefix as big-endian"
)]
fn declared_len(prefix: [u8; LENGTH_PREFIX_LEN]) -> usize {
    usize::try_from(u32::from_be_bytes(prefix)).unwrap_or(usize::MAX)
}
