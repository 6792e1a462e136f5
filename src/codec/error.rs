//! Error types for wire decoding.

use thiserror::Error;

/// Errors that can occur while encoding or decoding host wire data.
///
/// Only [`CodecError::TooLarge`] comes from encoding; every other variant
/// describes malformed or truncated input handed back by the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Truncated input: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("Declared lengths need {declared} body bytes, only {available} remain")]
    LengthOverflow { declared: usize, available: usize },

    #[error("Missing NUL terminator at offset {offset}")]
    MissingNul { offset: usize },

    #[error("{count} trailing bytes after encoded data")]
    TrailingBytes { count: usize },

    #[error("Invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("Length {len} does not fit a u32 wire field")]
    TooLarge { len: usize },
}
