//! Raw proxy-wasm entry points exported to the host.
//!
//! Each export forwards into the process-wide [`VmState`](crate::VmState).

use crate::dispatch::{HttpEvent, RootEvent, StreamEvent};
use crate::host::memory;
use crate::state::with_state;
use crate::types::{Action, PeerType};

#[unsafe(no_mangle)]
pub extern "C" fn proxy_abi_version_0_2_0() {}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_memory_allocate(size: usize) -> *mut u8 {
    memory::allocate(size)
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_context_create(context_id: u32, parent_context_id: u32) {
    with_state(|s| {
        s.on_context_create(context_id, parent_context_id);
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_vm_start(context_id: u32, vm_configuration_size: usize) -> bool {
    with_state(|s| {
        s.deliver_root_event(
            context_id,
            RootEvent::VmStart {
                vm_configuration_size,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_configure(context_id: u32, plugin_configuration_size: usize) -> bool {
    with_state(|s| {
        s.deliver_root_event(
            context_id,
            RootEvent::Configure {
                plugin_configuration_size,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_tick(context_id: u32) {
    with_state(|s| {
        s.deliver_root_event(context_id, RootEvent::Tick);
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_queue_ready(context_id: u32, queue_id: u32) {
    with_state(|s| {
        s.deliver_root_event(context_id, RootEvent::QueueReady { queue_id });
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_new_connection(context_id: u32) -> Action {
    with_state(|s| s.deliver_stream_event(context_id, StreamEvent::NewConnection))
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_downstream_data(
    context_id: u32,
    data_size: usize,
    end_of_stream: bool,
) -> Action {
    with_state(|s| {
        s.deliver_stream_event(
            context_id,
            StreamEvent::DownstreamData {
                data_size,
                end_of_stream,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_downstream_connection_close(context_id: u32, peer_type: u32) {
    with_state(|s| {
        s.deliver_stream_event(
            context_id,
            StreamEvent::DownstreamClose {
                peer: PeerType::from_raw(peer_type),
            },
        );
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_upstream_data(
    context_id: u32,
    data_size: usize,
    end_of_stream: bool,
) -> Action {
    with_state(|s| {
        s.deliver_stream_event(
            context_id,
            StreamEvent::UpstreamData {
                data_size,
                end_of_stream,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_upstream_connection_close(context_id: u32, peer_type: u32) {
    with_state(|s| {
        s.deliver_stream_event(
            context_id,
            StreamEvent::UpstreamClose {
                peer: PeerType::from_raw(peer_type),
            },
        );
    });
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_request_headers(
    context_id: u32,
    num_headers: usize,
    end_of_stream: bool,
) -> Action {
    with_state(|s| {
        s.deliver_http_event(
            context_id,
            HttpEvent::RequestHeaders {
                num_headers,
                end_of_stream,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_request_body(
    context_id: u32,
    body_size: usize,
    end_of_stream: bool,
) -> Action {
    with_state(|s| {
        s.deliver_http_event(
            context_id,
            HttpEvent::RequestBody {
                body_size,
                end_of_stream,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_request_trailers(context_id: u32, num_trailers: usize) -> Action {
    with_state(|s| s.deliver_http_event(context_id, HttpEvent::RequestTrailers { num_trailers }))
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_response_headers(
    context_id: u32,
    num_headers: usize,
    end_of_stream: bool,
) -> Action {
    with_state(|s| {
        s.deliver_http_event(
            context_id,
            HttpEvent::ResponseHeaders {
                num_headers,
                end_of_stream,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_response_body(
    context_id: u32,
    body_size: usize,
    end_of_stream: bool,
) -> Action {
    with_state(|s| {
        s.deliver_http_event(
            context_id,
            HttpEvent::ResponseBody {
                body_size,
                end_of_stream,
            },
        )
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_response_trailers(context_id: u32, num_trailers: usize) -> Action {
    with_state(|s| s.deliver_http_event(context_id, HttpEvent::ResponseTrailers { num_trailers }))
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_log(context_id: u32) {
    with_state(|s| s.on_log(context_id));
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_done(context_id: u32) -> bool {
    with_state(|s| s.on_done(context_id))
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_delete(context_id: u32) {
    with_state(|s| s.on_delete(context_id));
}

#[unsafe(no_mangle)]
pub extern "C" fn proxy_on_http_call_response(
    context_id: u32,
    callout_id: u32,
    num_headers: usize,
    body_size: usize,
    num_trailers: usize,
) {
    with_state(|s| {
        s.on_http_call_response(context_id, callout_id, num_headers, body_size, num_trailers)
    });
}
