//! Property path encoding: each segment followed by a NUL byte.

use super::buffer::{read_nul_terminated, write_nul_terminated};
use super::CodecError;

/// Encode path segments, e.g. `["request", "path"]` -> `request\0path\0`.
pub fn encode_property_path<S: AsRef<str>>(path: &[S]) -> Vec<u8> {
    let size = path.iter().map(|s| s.as_ref().len() + 1).sum();
    let mut out = Vec::with_capacity(size);
    for segment in path {
        write_nul_terminated(&mut out, segment.as_ref().as_bytes());
    }
    out
}

/// Decode an encoded property path back into its segments.
pub fn decode_property_path(bytes: &[u8]) -> Result<Vec<String>, CodecError> {
    let mut segments = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let rest = bytes.get(offset..).unwrap_or_default();
        let Some(len) = rest.iter().position(|b| *b == 0) else {
            return Err(CodecError::MissingNul {
                offset: bytes.len(),
            });
        };
        segments.push(read_nul_terminated(bytes, offset, len)?.to_string());
        offset += len + 1;
    }
    Ok(segments)
}
