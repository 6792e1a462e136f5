//! Capability traits implemented by plugin code.
//!
//! Every method has a default, so an implementation only overrides the
//! events it cares about. Returning `None` from a factory method opts out of
//! that child kind; the registry treats it as a normal outcome.

use crate::types::{Action, PeerType};

/// Long-lived plugin context. Owns the stream/HTTP contexts it creates and
/// every callout issued on their behalf.
pub trait RootContext {
    /// The VM has started. `vm_configuration_size` is the byte size of the
    /// VM configuration, readable through `hostcall::get_vm_configuration`.
    fn on_vm_start(&mut self, _vm_configuration_size: usize) -> bool {
        true
    }

    /// The plugin was (re)configured.
    fn on_configure(&mut self, _plugin_configuration_size: usize) -> bool {
        true
    }

    /// Periodic timer set with `hostcall::set_tick_period_milliseconds`.
    fn on_tick(&mut self) {}

    fn on_queue_ready(&mut self, _queue_id: u32) {}

    /// The host is shutting the plugin down. Return `false` to defer
    /// completion until `hostcall::done` is called.
    fn on_done(&mut self) -> bool {
        true
    }

    fn create_stream_context(&self, _context_id: u32) -> Option<Box<dyn StreamContext>> {
        None
    }

    fn create_http_context(&self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        None
    }
}

/// Context for one L4 connection.
pub trait StreamContext {
    fn on_new_connection(&mut self) -> Action {
        Action::Continue
    }

    fn on_downstream_data(&mut self, _data_size: usize, _end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_downstream_close(&mut self, _peer: PeerType) {}

    fn on_upstream_data(&mut self, _data_size: usize, _end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_upstream_close(&mut self, _peer: PeerType) {}

    /// The connection is finished; last chance to read connection state.
    fn on_log(&mut self) {}
}

/// Context for one HTTP request/response exchange.
pub trait HttpContext {
    fn on_http_request_headers(&mut self, _num_headers: usize, _end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_http_request_body(&mut self, _body_size: usize, _end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_http_request_trailers(&mut self, _num_trailers: usize) -> Action {
        Action::Continue
    }

    fn on_http_response_headers(&mut self, _num_headers: usize, _end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_http_response_body(&mut self, _body_size: usize, _end_of_stream: bool) -> Action {
        Action::Continue
    }

    fn on_http_response_trailers(&mut self, _num_trailers: usize) -> Action {
        Action::Continue
    }

    /// The exchange is finished; last chance to read request/response state.
    fn on_log(&mut self) {}
}

/// Root context used when the plugin never installs a factory.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRootContext;

impl RootContext for DefaultRootContext {}
