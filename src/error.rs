//! Error types for host calls and the unified crate error.
//!
//! Host calls fail in a small, closed set of ways, each represented by one
//! [`HostError`] variant so plugin code can branch on the specific outcome
//! (most notably [`HostError::CasMismatch`] to retry a shared-data update).
//! [`Error`] wraps host, codec and configuration failures behind one type.

use thiserror::Error;

use crate::codec::CodecError;
#[cfg(feature = "config")]
use crate::config::ConfigError;

/// A non-success outcome reported by the host.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostError {
    #[error("Not found")]
    NotFound,

    #[error("Bad argument")]
    BadArgument,

    #[error("Buffer size too small")]
    SizeTooSmall,

    #[error("Not allowed by the current sandbox policy")]
    NotAllowed,

    #[error("Empty result")]
    Empty,

    #[error("CAS mismatch")]
    CasMismatch,

    #[error("Internal failure")]
    InternalFailure,

    #[error("Unimplemented")]
    Unimplemented,
}

/// Unified error type for all plugin-facing operations.
///
/// # Example
///
/// ```ignore
/// use proxy_shim::{hostcall, Result};
///
/// fn user_agent() -> Result<String> {
///     hostcall::get_http_request_header("user-agent")
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The host reported a non-success status.
    #[error(transparent)]
    Host(#[from] HostError),

    /// Wire data returned by the host could not be decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Plugin configuration could not be parsed.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the host status behind this error, if any.
    pub fn host_error(&self) -> Option<HostError> {
        match self {
            Self::Host(e) => Some(*e),
            _ => None,
        }
    }

    /// Returns `true` if this is a host-reported error.
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }

    /// Returns `true` if this is a wire decoding error.
    pub fn is_codec(&self) -> bool {
        matches!(self, Self::Codec(_))
    }

    /// Returns `true` if a shared-data write lost a compare-and-swap race.
    pub fn is_cas_mismatch(&self) -> bool {
        matches!(self, Self::Host(HostError::CasMismatch))
    }

    /// Returns `true` if the host reported that the item does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Host(HostError::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cas_mismatch_is_detectable() {
        let err = Error::from(HostError::CasMismatch);
        assert!(err.is_cas_mismatch());
        assert!(err.is_host());
        assert!(!err.is_not_found());
        assert_eq!(err.host_error(), Some(HostError::CasMismatch));
    }

    #[test]
    fn test_codec_error_is_not_host() {
        let err = Error::from(CodecError::Truncated { needed: 4, available: 1 });
        assert!(err.is_codec());
        assert!(!err.is_host());
        assert_eq!(err.host_error(), None);
    }
}
