//! # Campus Codec
//!
//! Wire codec for the campus sync servers.
//!
//! Every message on both channels is one frame:
//!
//! ```text
//! +----------------+---------------------------+
//! | len: u32 (BE)  | CBOR document (len bytes) |
//! +----------------+---------------------------+
//! ```
//!
//! The payload is a self-describing CBOR encoding of a serde type, so the
//! receiver can tell which variant of the closed message set it got.
//!
//! ## Usage
//!
//! ```
//! use campus_codec::{decode_message, encode_message, DEFAULT_MAX_FRAME_LEN};
//!
//! let frame = encode_message(&("CSE101", 3.0_f64), DEFAULT_MAX_FRAME_LEN).unwrap();
//! let decoded: (String, f64) = decode_message(&frame, DEFAULT_MAX_FRAME_LEN).unwrap();
//! assert_eq!(decoded, ("CSE101".to_string(), 3.0));
//! ```
//!
//! This is a pure codec crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod error;
mod frame;

pub use cbor::{from_cbor, to_cbor};
pub use error::{CodecError, CodecResult};
pub use frame::{encode_frame, frame_len, split_frame, DEFAULT_MAX_FRAME_LEN, FRAME_HEADER_LEN};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a message into a complete frame.
///
/// # Errors
///
/// Returns an error if serialization fails or the payload exceeds `max_len`.
pub fn encode_message<T: Serialize>(message: &T, max_len: usize) -> CodecResult<Bytes> {
    let payload = to_cbor(message)?;
    encode_frame(&payload, max_len)
}

/// Decode a message from a complete frame.
///
/// # Errors
///
/// Returns an error if the frame is truncated, oversized, followed by
/// extra bytes, or does not decode as `T`.
pub fn decode_message<T: DeserializeOwned>(frame: &[u8], max_len: usize) -> CodecResult<T> {
    let (payload, rest) = split_frame(frame, max_len)?;
    if !rest.is_empty() {
        return Err(CodecError::decoding_failed("bytes after frame end"));
    }
    from_cbor(payload)
}
