//! Length-prefixed framing.
//!
//! A frame is a 4-byte big-endian payload length followed by the payload.

use crate::error::{CodecError, CodecResult};
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the frame header in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Default upper bound on a single frame payload (64 MiB).
///
/// File uploads travel as one frame, so this is also the upload size limit.
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Wrap a payload in a frame.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] if the payload exceeds `max_len`.
pub fn encode_frame(payload: &[u8], max_len: usize) -> CodecResult<Bytes> {
    if payload.len() > max_len {
        return Err(CodecError::FrameTooLarge {
            len: payload.len(),
            max: max_len,
        });
    }
    let len = u32::try_from(payload.len()).map_err(|_| CodecError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut buf = BytesMut::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.put_u32(len);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Parse a frame header and validate the announced length.
///
/// # Errors
///
/// Returns [`CodecError::FrameTooLarge`] if the length exceeds `max_len`.
pub fn frame_len(header: [u8; FRAME_HEADER_LEN], max_len: usize) -> CodecResult<usize> {
    let len = u32::from_be_bytes(header) as usize;
    if len > max_len {
        return Err(CodecError::FrameTooLarge { len, max: max_len });
    }
    Ok(len)
}

/// Split one complete frame off the front of `bytes`.
///
/// Returns the payload and the remaining input.
///
/// # Errors
///
/// Returns [`CodecError::TruncatedFrame`] if `bytes` does not hold a whole frame.
pub fn split_frame(bytes: &[u8], max_len: usize) -> CodecResult<(&[u8], &[u8])> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(CodecError::TruncatedFrame {
            expected: FRAME_HEADER_LEN,
            actual: bytes.len(),
        });
    }
    let mut header = [0u8; FRAME_HEADER_LEN];
    header.copy_from_slice(&bytes[..FRAME_HEADER_LEN]);
    let len = frame_len(header, max_len)?;

    let body = &bytes[FRAME_HEADER_LEN..];
    if body.len() < len {
        return Err(CodecError::TruncatedFrame {
            expected: len,
            actual: body.len(),
        });
    }
    Ok(body.split_at(len))
}
