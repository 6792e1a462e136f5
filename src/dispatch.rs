//! Delivery of host lifecycle events into plugin contexts.
//!
//! Every entry point records the active context id before running user code,
//! then routes the event to the context stored under that id. Events for an
//! id that is not live, or that lives in the wrong table, mean the host and
//! guest disagree about context state and abort via
//! [`protocol_violation`](crate::state).

use crate::logging::{debug, warn};
use crate::state::{VmState, protocol_violation};
use crate::types::{Action, ContextKind, PeerType};

/// Events delivered to a root context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootEvent {
    VmStart { vm_configuration_size: usize },
    Configure { plugin_configuration_size: usize },
    Tick,
    QueueReady { queue_id: u32 },
}

/// Events delivered to a stream (L4) context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEvent {
    NewConnection,
    DownstreamData { data_size: usize, end_of_stream: bool },
    DownstreamClose { peer: PeerType },
    UpstreamData { data_size: usize, end_of_stream: bool },
    UpstreamClose { peer: PeerType },
    Log,
}

/// Events delivered to an HTTP context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpEvent {
    RequestHeaders { num_headers: usize, end_of_stream: bool },
    RequestBody { body_size: usize, end_of_stream: bool },
    RequestTrailers { num_trailers: usize },
    ResponseHeaders { num_headers: usize, end_of_stream: bool },
    ResponseBody { body_size: usize, end_of_stream: bool },
    ResponseTrailers { num_trailers: usize },
    Log,
}

impl VmState {
    /// Handle `proxy_on_context_create`.
    ///
    /// A zero parent creates a root. Otherwise the parent root is asked for
    /// an HTTP context first and a stream context second; `None` means it
    /// declined both.
    pub fn on_context_create(&self, context_id: u32, parent_context_id: u32) -> Option<ContextKind> {
        if parent_context_id == 0 {
            self.create_root(context_id);
            return Some(ContextKind::Root);
        }
        if self.create_child(context_id, parent_context_id, ContextKind::Http) {
            return Some(ContextKind::Http);
        }
        if self.create_child(context_id, parent_context_id, ContextKind::Stream) {
            return Some(ContextKind::Stream);
        }
        warn!(
            context_id,
            parent_context_id, "root context declined both http and stream contexts"
        );
        None
    }

    /// Deliver a root event. Tick and queue events always report `true`.
    pub fn deliver_root_event(&self, context_id: u32, event: RootEvent) -> bool {
        self.set_active(context_id);
        let mut roots = self.roots.borrow_mut();
        let Some(root) = roots.get_mut(&context_id) else {
            protocol_violation(format_args!("{event:?} for unknown root context {context_id}"));
        };

        match event {
            RootEvent::VmStart {
                vm_configuration_size,
            } => root.on_vm_start(vm_configuration_size),
            RootEvent::Configure {
                plugin_configuration_size,
            } => root.on_configure(plugin_configuration_size),
            RootEvent::Tick => {
                root.on_tick();
                true
            }
            RootEvent::QueueReady { queue_id } => {
                root.on_queue_ready(queue_id);
                true
            }
        }
    }

    /// Deliver a stream event. Close and log events report [`Action::Continue`].
    pub fn deliver_stream_event(&self, context_id: u32, event: StreamEvent) -> Action {
        self.set_active(context_id);
        let mut streams = self.streams.borrow_mut();
        let Some(stream) = streams.get_mut(&context_id) else {
            protocol_violation(format_args!(
                "{event:?} for unknown stream context {context_id}"
            ));
        };

        match event {
            StreamEvent::NewConnection => stream.on_new_connection(),
            StreamEvent::DownstreamData {
                data_size,
                end_of_stream,
            } => stream.on_downstream_data(data_size, end_of_stream),
            StreamEvent::DownstreamClose { peer } => {
                stream.on_downstream_close(peer);
                Action::Continue
            }
            StreamEvent::UpstreamData {
                data_size,
                end_of_stream,
            } => stream.on_upstream_data(data_size, end_of_stream),
            StreamEvent::UpstreamClose { peer } => {
                stream.on_upstream_close(peer);
                Action::Continue
            }
            StreamEvent::Log => {
                stream.on_log();
                Action::Continue
            }
        }
    }

    /// Deliver an HTTP event. Log events report [`Action::Continue`].
    pub fn deliver_http_event(&self, context_id: u32, event: HttpEvent) -> Action {
        self.set_active(context_id);
        let mut http = self.http.borrow_mut();
        let Some(ctx) = http.get_mut(&context_id) else {
            protocol_violation(format_args!("{event:?} for unknown http context {context_id}"));
        };

        match event {
            HttpEvent::RequestHeaders {
                num_headers,
                end_of_stream,
            } => ctx.on_http_request_headers(num_headers, end_of_stream),
            HttpEvent::RequestBody {
                body_size,
                end_of_stream,
            } => ctx.on_http_request_body(body_size, end_of_stream),
            HttpEvent::RequestTrailers { num_trailers } => ctx.on_http_request_trailers(num_trailers),
            HttpEvent::ResponseHeaders {
                num_headers,
                end_of_stream,
            } => ctx.on_http_response_headers(num_headers, end_of_stream),
            HttpEvent::ResponseBody {
                body_size,
                end_of_stream,
            } => ctx.on_http_response_body(body_size, end_of_stream),
            HttpEvent::ResponseTrailers { num_trailers } => {
                ctx.on_http_response_trailers(num_trailers)
            }
            HttpEvent::Log => {
                ctx.on_log();
                Action::Continue
            }
        }
    }

    /// Handle `proxy_on_log`, which names a context of any kind.
    pub fn on_log(&self, context_id: u32) {
        match self.kind_of(context_id) {
            Some(ContextKind::Stream) => {
                self.deliver_stream_event(context_id, StreamEvent::Log);
            }
            Some(ContextKind::Http) => {
                self.deliver_http_event(context_id, HttpEvent::Log);
            }
            Some(ContextKind::Root) => {}
            None => protocol_violation(format_args!("log for unknown context {context_id}")),
        }
    }

    /// Handle `proxy_on_done`. Only roots can defer completion.
    pub fn on_done(&self, context_id: u32) -> bool {
        match self.kind_of(context_id) {
            Some(ContextKind::Root) => {
                self.set_active(context_id);
                let mut roots = self.roots.borrow_mut();
                roots.get_mut(&context_id).is_none_or(|root| root.on_done())
            }
            Some(_) => true,
            None => protocol_violation(format_args!("done for unknown context {context_id}")),
        }
    }

    /// Handle `proxy_on_http_call_response`.
    ///
    /// The callback runs with the issuing context active, so further host
    /// calls it makes are attributed to that context.
    pub fn on_http_call_response(
        &self,
        root_id: u32,
        callout_id: u32,
        num_headers: usize,
        body_size: usize,
        num_trailers: usize,
    ) {
        let Some(attribute) = self.resolve_callout(root_id, callout_id) else {
            protocol_violation(format_args!(
                "response for unknown callout {callout_id} on root {root_id}"
            ));
        };

        let caller = attribute.caller_context_id;
        // A caller deleted while its call was in flight still belongs to
        // this root for the length of the callback, so it can chain calls.
        let orphaned = self.root_id_of(caller).is_none();
        if orphaned {
            self.root_ids.borrow_mut().insert(caller, root_id);
        }

        self.set_active(caller);
        debug!(callout_id, root_id, caller, orphaned, "delivering callout response");
        (attribute.callback)(num_headers, body_size, num_trailers);

        if orphaned {
            self.root_ids.borrow_mut().remove(&caller);
        }
    }

    /// Handle `proxy_on_delete`.
    pub fn on_delete(&self, context_id: u32) {
        self.destroy(context_id);
    }
}
