//! Wire encodings shared with the host.
//!
//! These formats are fixed by the host ABI and produced byte-for-byte.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for decoding
//! - [`buffer`]: Bounds-checked read/write helpers
//! - [`map`]: Ordered key/value map encoding (headers, trailers)
//! - [`path`]: NUL-separated property path encoding
//!
//! Raw buffers (bodies, shared data, queue payloads) have no framing at all;
//! their pointer/length handling lives in [`crate::host::memory`].

mod buffer;
mod error;
mod map;
mod path;

pub use error::CodecError;
pub use map::{decode_map, encode_map};
pub use path::{decode_property_path, encode_property_path};

/// Decode an unframed host string (e.g. a single header value).
pub fn decode_string(bytes: Vec<u8>) -> Result<String, CodecError> {
    String::from_utf8(bytes).map_err(|e| CodecError::InvalidUtf8 {
        offset: e.utf8_error().valid_up_to(),
    })
}
