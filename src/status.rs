//! Raw host status codes.
//!
//! Every host call returns one `u32` from a closed set. Codes 0, 1, 2, 7, 8,
//! 10 and 12 carry their proxy-wasm ABI 0.2 numbering; the two outcomes that
//! ABI revision does not number (`SizeTooSmall`, `NotAllowed`) use 13 and 14.
//! Anything outside the set is treated as an internal failure.

use crate::error::HostError;

/// Outcome code returned by a host call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    NotFound = 1,
    BadArgument = 2,
    Empty = 7,
    CasMismatch = 8,
    InternalFailure = 10,
    Unimplemented = 12,
    SizeTooSmall = 13,
    NotAllowed = 14,
}

impl Status {
    /// Interpret a raw code. Unknown codes become [`Status::InternalFailure`].
    pub fn from_raw(code: u32) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::NotFound,
            2 => Self::BadArgument,
            7 => Self::Empty,
            8 => Self::CasMismatch,
            10 => Self::InternalFailure,
            12 => Self::Unimplemented,
            13 => Self::SizeTooSmall,
            14 => Self::NotAllowed,
            _ => Self::InternalFailure,
        }
    }

    pub fn as_raw(self) -> u32 {
        self as u32
    }

    /// The error for this status, or `None` for [`Status::Ok`].
    pub fn error(self) -> Option<HostError> {
        match self {
            Self::Ok => None,
            Self::NotFound => Some(HostError::NotFound),
            Self::BadArgument => Some(HostError::BadArgument),
            Self::SizeTooSmall => Some(HostError::SizeTooSmall),
            Self::NotAllowed => Some(HostError::NotAllowed),
            Self::Empty => Some(HostError::Empty),
            Self::CasMismatch => Some(HostError::CasMismatch),
            Self::InternalFailure => Some(HostError::InternalFailure),
            Self::Unimplemented => Some(HostError::Unimplemented),
        }
    }

    pub fn into_result(self) -> Result<(), HostError> {
        match self.error() {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }
}

impl From<HostError> for Status {
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotFound => Self::NotFound,
            HostError::BadArgument => Self::BadArgument,
            HostError::SizeTooSmall => Self::SizeTooSmall,
            HostError::NotAllowed => Self::NotAllowed,
            HostError::Empty => Self::Empty,
            HostError::CasMismatch => Self::CasMismatch,
            HostError::InternalFailure => Self::InternalFailure,
            HostError::Unimplemented => Self::Unimplemented,
        }
    }
}

/// Map a raw host code straight to its error, `None` meaning success.
pub fn to_error(code: u32) -> Option<HostError> {
    Status::from_raw(code).error()
}
