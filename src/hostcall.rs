//! Plugin-facing host calls.
//!
//! Each function encodes its arguments for the wire, issues one call through
//! the installed [`Host`](crate::host::Host), and decodes the result. Every
//! failure is returned to the caller as an [`Error`]; nothing here retries.
//!
//! ```ignore
//! use proxy_shim::hostcall;
//!
//! // Optimistic update of a shared counter.
//! loop {
//!     let (mut value, cas) = hostcall::get_shared_data("hits")?;
//!     value[0] += 1;
//!     match hostcall::set_shared_data("hits", &value, cas) {
//!         Err(e) if e.is_cas_mismatch() => continue,
//!         other => break other?,
//!     }
//! }
//! ```

use std::time::Duration;

use crate::codec::{decode_map, decode_string, encode_map, encode_property_path};
use crate::error::{Error, Result};
use crate::host::with_host;
use crate::logging::trace;
use crate::state::with_state;
use crate::types::{BufferType, Headers, LogLevel, MapType, StreamType};

/// `start` value that appends to the end of a buffer.
const BUFFER_END: usize = i32::MAX as usize;

// =============================================================================
// Logging
// =============================================================================

pub fn log(level: LogLevel, message: &str) -> Result<()> {
    Ok(with_host(|h| h.log(level, message))?)
}

pub fn log_trace(message: &str) -> Result<()> {
    log(LogLevel::Trace, message)
}

pub fn log_debug(message: &str) -> Result<()> {
    log(LogLevel::Debug, message)
}

pub fn log_info(message: &str) -> Result<()> {
    log(LogLevel::Info, message)
}

pub fn log_warn(message: &str) -> Result<()> {
    log(LogLevel::Warn, message)
}

pub fn log_error(message: &str) -> Result<()> {
    log(LogLevel::Error, message)
}

pub fn log_critical(message: &str) -> Result<()> {
    log(LogLevel::Critical, message)
}

// =============================================================================
// Configuration and timers
// =============================================================================

/// Read the plugin configuration; `size` comes from `on_configure`.
pub fn get_plugin_configuration(size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::PluginConfiguration, 0, size)
}

/// Read the VM configuration; `size` comes from `on_vm_start`.
pub fn get_vm_configuration(size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::VmConfiguration, 0, size)
}

pub fn set_tick_period(period: Duration) -> Result<()> {
    let millis = u32::try_from(period.as_millis()).unwrap_or(u32::MAX);
    Ok(with_host(|h| h.set_tick_period_milliseconds(millis))?)
}

// =============================================================================
// Local responses and outbound calls
// =============================================================================

/// Answer the current request directly instead of forwarding it.
pub fn send_http_response(status_code: u32, headers: &[(&str, &str)], body: &[u8]) -> Result<()> {
    let encoded = encode_map(headers)?;
    Ok(with_host(|h| h.send_local_response(status_code, "", body, &encoded, -1))?)
}

/// Start an outbound HTTP call to `upstream` (a cluster name).
///
/// `callback` runs when the response arrives, with the calling context made
/// active again; read the response with [`get_http_call_response_headers`]
/// and friends from inside it. Returns the callout id.
pub fn dispatch_http_call<F>(
    upstream: &str,
    headers: &[(&str, &str)],
    body: &[u8],
    trailers: &[(&str, &str)],
    timeout: Duration,
    callback: F,
) -> Result<u32>
where
    F: FnOnce(usize, usize, usize) + 'static,
{
    let encoded_headers = encode_map(headers)?;
    let encoded_trailers = encode_map(trailers)?;
    let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);

    let callout_id = with_host(|h| {
        h.http_call(upstream, &encoded_headers, body, &encoded_trailers, timeout_ms)
    })?;
    with_state(|s| s.register_callout(callout_id, Box::new(callback)));
    trace!(callout_id, upstream, "dispatched http call");
    Ok(callout_id)
}

pub fn get_http_call_response_headers() -> Result<Headers> {
    get_map(MapType::HttpCallResponseHeaders)
}

pub fn get_http_call_response_body(start: usize, max_size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::HttpCallResponseBody, start, max_size)
}

pub fn get_http_call_response_trailers() -> Result<Headers> {
    get_map(MapType::HttpCallResponseTrailers)
}

pub fn call_foreign_function(name: &str, arguments: &[u8]) -> Result<Vec<u8>> {
    Ok(with_host(|h| h.call_foreign_function(name, arguments))?)
}

// =============================================================================
// L4 stream data
// =============================================================================

pub fn get_downstream_data(start: usize, max_size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::DownstreamData, start, max_size)
}

pub fn append_downstream_data(data: &[u8]) -> Result<()> {
    append_to_buffer(BufferType::DownstreamData, data)
}

pub fn prepend_downstream_data(data: &[u8]) -> Result<()> {
    prepend_to_buffer(BufferType::DownstreamData, data)
}

pub fn replace_downstream_data(data: &[u8]) -> Result<()> {
    replace_buffer(BufferType::DownstreamData, data)
}

pub fn get_upstream_data(start: usize, max_size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::UpstreamData, start, max_size)
}

pub fn append_upstream_data(data: &[u8]) -> Result<()> {
    append_to_buffer(BufferType::UpstreamData, data)
}

pub fn prepend_upstream_data(data: &[u8]) -> Result<()> {
    prepend_to_buffer(BufferType::UpstreamData, data)
}

pub fn replace_upstream_data(data: &[u8]) -> Result<()> {
    replace_buffer(BufferType::UpstreamData, data)
}

pub fn continue_downstream() -> Result<()> {
    Ok(with_host(|h| h.continue_stream(StreamType::Downstream))?)
}

pub fn continue_upstream() -> Result<()> {
    Ok(with_host(|h| h.continue_stream(StreamType::Upstream))?)
}

pub fn close_downstream() -> Result<()> {
    Ok(with_host(|h| h.close_stream(StreamType::Downstream))?)
}

pub fn close_upstream() -> Result<()> {
    Ok(with_host(|h| h.close_stream(StreamType::Upstream))?)
}

// =============================================================================
// HTTP request
// =============================================================================

pub fn get_http_request_headers() -> Result<Headers> {
    get_map(MapType::HttpRequestHeaders)
}

pub fn set_http_request_headers(headers: &[(&str, &str)]) -> Result<()> {
    set_map(MapType::HttpRequestHeaders, headers)
}

pub fn get_http_request_header(key: &str) -> Result<String> {
    get_map_value(MapType::HttpRequestHeaders, key)
}

pub fn set_http_request_header(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.replace_header_map_value(MapType::HttpRequestHeaders, key, value))?)
}

pub fn add_http_request_header(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.add_header_map_value(MapType::HttpRequestHeaders, key, value))?)
}

pub fn remove_http_request_header(key: &str) -> Result<()> {
    Ok(with_host(|h| h.remove_header_map_value(MapType::HttpRequestHeaders, key))?)
}

pub fn get_http_request_body(start: usize, max_size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::HttpRequestBody, start, max_size)
}

pub fn append_http_request_body(data: &[u8]) -> Result<()> {
    append_to_buffer(BufferType::HttpRequestBody, data)
}

pub fn prepend_http_request_body(data: &[u8]) -> Result<()> {
    prepend_to_buffer(BufferType::HttpRequestBody, data)
}

pub fn replace_http_request_body(data: &[u8]) -> Result<()> {
    replace_buffer(BufferType::HttpRequestBody, data)
}

pub fn get_http_request_trailers() -> Result<Headers> {
    get_map(MapType::HttpRequestTrailers)
}

pub fn set_http_request_trailers(trailers: &[(&str, &str)]) -> Result<()> {
    set_map(MapType::HttpRequestTrailers, trailers)
}

pub fn get_http_request_trailer(key: &str) -> Result<String> {
    get_map_value(MapType::HttpRequestTrailers, key)
}

pub fn set_http_request_trailer(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.replace_header_map_value(MapType::HttpRequestTrailers, key, value))?)
}

pub fn add_http_request_trailer(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.add_header_map_value(MapType::HttpRequestTrailers, key, value))?)
}

pub fn remove_http_request_trailer(key: &str) -> Result<()> {
    Ok(with_host(|h| h.remove_header_map_value(MapType::HttpRequestTrailers, key))?)
}

/// Resume a request paused by returning [`Action::Pause`](crate::Action::Pause).
pub fn resume_http_request() -> Result<()> {
    Ok(with_host(|h| h.continue_stream(StreamType::Request))?)
}

// =============================================================================
// HTTP response
// =============================================================================

pub fn get_http_response_headers() -> Result<Headers> {
    get_map(MapType::HttpResponseHeaders)
}

pub fn set_http_response_headers(headers: &[(&str, &str)]) -> Result<()> {
    set_map(MapType::HttpResponseHeaders, headers)
}

pub fn get_http_response_header(key: &str) -> Result<String> {
    get_map_value(MapType::HttpResponseHeaders, key)
}

pub fn set_http_response_header(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.replace_header_map_value(MapType::HttpResponseHeaders, key, value))?)
}

pub fn add_http_response_header(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.add_header_map_value(MapType::HttpResponseHeaders, key, value))?)
}

pub fn remove_http_response_header(key: &str) -> Result<()> {
    Ok(with_host(|h| h.remove_header_map_value(MapType::HttpResponseHeaders, key))?)
}

pub fn get_http_response_body(start: usize, max_size: usize) -> Result<Vec<u8>> {
    get_buffer(BufferType::HttpResponseBody, start, max_size)
}

pub fn append_http_response_body(data: &[u8]) -> Result<()> {
    append_to_buffer(BufferType::HttpResponseBody, data)
}

pub fn prepend_http_response_body(data: &[u8]) -> Result<()> {
    prepend_to_buffer(BufferType::HttpResponseBody, data)
}

pub fn replace_http_response_body(data: &[u8]) -> Result<()> {
    replace_buffer(BufferType::HttpResponseBody, data)
}

pub fn get_http_response_trailers() -> Result<Headers> {
    get_map(MapType::HttpResponseTrailers)
}

pub fn set_http_response_trailers(trailers: &[(&str, &str)]) -> Result<()> {
    set_map(MapType::HttpResponseTrailers, trailers)
}

pub fn get_http_response_trailer(key: &str) -> Result<String> {
    get_map_value(MapType::HttpResponseTrailers, key)
}

pub fn set_http_response_trailer(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.replace_header_map_value(MapType::HttpResponseTrailers, key, value))?)
}

pub fn add_http_response_trailer(key: &str, value: &str) -> Result<()> {
    Ok(with_host(|h| h.add_header_map_value(MapType::HttpResponseTrailers, key, value))?)
}

pub fn remove_http_response_trailer(key: &str) -> Result<()> {
    Ok(with_host(|h| h.remove_header_map_value(MapType::HttpResponseTrailers, key))?)
}

pub fn resume_http_response() -> Result<()> {
    Ok(with_host(|h| h.continue_stream(StreamType::Response))?)
}

// =============================================================================
// Shared queues and shared data
// =============================================================================

pub fn register_shared_queue(name: &str) -> Result<u32> {
    Ok(with_host(|h| h.register_shared_queue(name))?)
}

/// Look up a queue registered by the VM `vm_id`.
pub fn resolve_shared_queue(vm_id: &str, name: &str) -> Result<u32> {
    Ok(with_host(|h| h.resolve_shared_queue(vm_id, name))?)
}

pub fn dequeue_shared_queue(queue_id: u32) -> Result<Vec<u8>> {
    Ok(with_host(|h| h.dequeue_shared_queue(queue_id))?)
}

pub fn enqueue_shared_queue(queue_id: u32, payload: &[u8]) -> Result<()> {
    Ok(with_host(|h| h.enqueue_shared_queue(queue_id, payload))?)
}

/// Read a shared value together with its CAS token.
pub fn get_shared_data(key: &str) -> Result<(Vec<u8>, u32)> {
    Ok(with_host(|h| h.get_shared_data(key))?)
}

/// Write a shared value.
///
/// With a non-zero `cas`, the write only succeeds if nobody wrote since the
/// token was read; otherwise the error satisfies
/// [`Error::is_cas_mismatch`].
pub fn set_shared_data(key: &str, value: &[u8], cas: u32) -> Result<()> {
    Ok(with_host(|h| h.set_shared_data(key, value, cas))?)
}

// =============================================================================
// Properties and lifecycle
// =============================================================================

/// Read a host property, e.g. `&["request", "path"]`.
pub fn get_property(path: &[&str]) -> Result<Vec<u8>> {
    let encoded = encode_property_path(path);
    Ok(with_host(|h| h.get_property(&encoded))?)
}

pub fn set_property(path: &[&str], value: &[u8]) -> Result<()> {
    let encoded = encode_property_path(path);
    Ok(with_host(|h| h.set_property(&encoded, value))?)
}

/// Signal completion after a root deferred it from `on_done`.
pub fn done() -> Result<()> {
    Ok(with_host(|h| h.done())?)
}

// =============================================================================
// Helpers
// =============================================================================

/// A zero-length reply is the host's shorthand for an absent map.
fn get_map(map: MapType) -> Result<Headers> {
    let encoded = with_host(|h| h.get_header_map_pairs(map))?;
    if encoded.is_empty() {
        return Ok(Headers::new());
    }
    Ok(decode_map(&encoded)?)
}

fn set_map(map: MapType, pairs: &[(&str, &str)]) -> Result<()> {
    let encoded = encode_map(pairs)?;
    Ok(with_host(|h| h.set_header_map_pairs(map, &encoded))?)
}

fn get_map_value(map: MapType, key: &str) -> Result<String> {
    let raw = with_host(|h| h.get_header_map_value(map, key))?;
    decode_string(raw).map_err(Error::from)
}

fn get_buffer(buffer: BufferType, start: usize, max_size: usize) -> Result<Vec<u8>> {
    Ok(with_host(|h| h.get_buffer_bytes(buffer, start, max_size))?)
}

fn append_to_buffer(buffer: BufferType, data: &[u8]) -> Result<()> {
    Ok(with_host(|h| h.set_buffer_bytes(buffer, BUFFER_END, 0, data))?)
}

fn prepend_to_buffer(buffer: BufferType, data: &[u8]) -> Result<()> {
    Ok(with_host(|h| h.set_buffer_bytes(buffer, 0, 0, data))?)
}

fn replace_buffer(buffer: BufferType, data: &[u8]) -> Result<()> {
    Ok(with_host(|h| h.set_buffer_bytes(buffer, 0, BUFFER_END, data))?)
}
