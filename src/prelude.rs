//! Prelude module for convenient imports.
//!
//! ```ignore
//! use proxy_shim::prelude::*;
//! ```

pub use crate::context::{DefaultRootContext, HttpContext, RootContext, StreamContext};
pub use crate::error::{Error, HostError, Result};
pub use crate::hostcall;
pub use crate::state::set_root_context;
pub use crate::types::{Action, Headers, LogLevel, PeerType};

#[cfg(feature = "config")]
pub use crate::config::{self, ConfigFormat};
