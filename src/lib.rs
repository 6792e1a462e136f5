//! Guest-side runtime shim for proxy plugins.
//!
//! A plugin compiled to WebAssembly talks to its host proxy through a narrow
//! foreign-call boundary: pointer/length pairs, integer status codes and
//! numeric context handles. This crate owns the guest half of that boundary:
//!
//! - it tracks every live root, stream and HTTP context the host creates,
//! - it correlates asynchronous host completions (outbound HTTP calls) back
//!   to the context that issued them,
//! - it encodes and decodes the fixed binary wire formats,
//! - it maps raw host status codes to typed errors.
//!
//! # Quick Start
//!
//! ```ignore
//! use proxy_shim::prelude::*;
//!
//! struct Root;
//!
//! impl RootContext for Root {
//!     fn create_http_context(&self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
//!         Some(Box::new(Filter))
//!     }
//! }
//!
//! struct Filter;
//!
//! impl HttpContext for Filter {
//!     fn on_http_request_headers(&mut self, _num_headers: usize, _end_of_stream: bool) -> Action {
//!         let _ = hostcall::set_http_request_header("x-plugin", "on");
//!         Action::Continue
//!     }
//! }
//!
//! proxy_shim::set_root_context(|_| Box::new(Root));
//! ```
//!
//! # Modules
//!
//! - [`status`] - Raw host status codes and their mapping to errors
//! - [`codec`] - Map, buffer and property-path wire encodings
//! - [`state`] - Context registry shared by every dispatch entry point
//! - [`callout`] - Per-root tables of in-flight asynchronous calls
//! - [`dispatch`] - Lifecycle event delivery into user contexts
//! - [`host`] - The [`Host`] seam and the raw ABI bindings
//! - [`hostcall`] - Plugin-facing host call wrappers
//! - [`config`] - Typed plugin configuration (requires `config` feature)
//!
//! # Execution Model
//!
//! The host drives the guest one entry point at a time on a single thread and
//! never re-enters the guest synchronously from inside a host call. The
//! registry therefore lives in a thread-local singleton without locks, and a
//! single "active context" slot is enough to attribute new callouts.
//!
//! # Feature Flags
//!
//! - `logging` - Enable library-level tracing (enabled by default)
//! - `host-log` - Provide [`HostLogLayer`] to forward tracing events to the host
//! - `config` - Enable JSON/TOML plugin configuration parsing
//! - `full` - Enable all features

pub mod callout;
pub mod codec;
#[cfg(feature = "config")]
pub mod config;
pub mod context;
pub mod dispatch;
mod error;
#[cfg(target_arch = "wasm32")]
mod exports;
pub mod host;
pub mod hostcall;
mod logging;
pub mod prelude;
pub mod state;
pub mod status;
pub mod types;

pub use error::{Error, HostError, Result};

pub use callout::{CalloutAttribute, CalloutCallback};
pub use codec::CodecError;
pub use context::{DefaultRootContext, HttpContext, RootContext, StreamContext};
pub use dispatch::{HttpEvent, RootEvent, StreamEvent};
pub use host::Host;
pub use state::{VmState, set_root_context};
pub use status::Status;
pub use types::{
    Action, BufferType, ContextKind, Headers, LogLevel, MapType, PeerType, StreamType,
};

#[cfg(feature = "config")]
pub use config::{ConfigError, ConfigFormat};

#[cfg(feature = "host-log")]
pub use logging::HostLogLayer;
