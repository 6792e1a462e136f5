//! Raw proxy-wasm ABI imports and the [`Host`] implementation over them.
//!
//! Every import returns a raw status code; results come back through
//! out-pointers. Buffers the host returns were allocated through
//! `proxy_on_memory_allocate` and are adopted with [`take_host_bytes`].

use std::ptr::null_mut;

use super::Host;
use super::memory::{abi_ptr, take_host_bytes};
use crate::error::HostError;
use crate::status::Status;
use crate::types::{BufferType, LogLevel, MapType, StreamType};

#[link(wasm_import_module = "env")]
unsafe extern "C" {
    fn proxy_log(level: u32, message_data: *const u8, message_size: usize) -> u32;
    fn proxy_set_tick_period_milliseconds(period: u32) -> u32;
    fn proxy_get_buffer_bytes(
        buffer_type: u32,
        start: usize,
        max_size: usize,
        return_buffer_data: *mut *mut u8,
        return_buffer_size: *mut usize,
    ) -> u32;
    fn proxy_set_buffer_bytes(
        buffer_type: u32,
        start: usize,
        size: usize,
        buffer_data: *const u8,
        buffer_size: usize,
    ) -> u32;
    fn proxy_get_header_map_pairs(
        map_type: u32,
        return_map_data: *mut *mut u8,
        return_map_size: *mut usize,
    ) -> u32;
    fn proxy_set_header_map_pairs(map_type: u32, map_data: *const u8, map_size: usize) -> u32;
    fn proxy_get_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32;
    fn proxy_replace_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;
    fn proxy_remove_header_map_value(map_type: u32, key_data: *const u8, key_size: usize) -> u32;
    fn proxy_add_header_map_value(
        map_type: u32,
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;
    fn proxy_continue_stream(stream_type: u32) -> u32;
    fn proxy_close_stream(stream_type: u32) -> u32;
    fn proxy_send_local_response(
        status_code: u32,
        status_code_details_data: *const u8,
        status_code_details_size: usize,
        body_data: *const u8,
        body_size: usize,
        headers_data: *const u8,
        headers_size: usize,
        grpc_status: i32,
    ) -> u32;
    fn proxy_http_call(
        upstream_data: *const u8,
        upstream_size: usize,
        headers_data: *const u8,
        headers_size: usize,
        body_data: *const u8,
        body_size: usize,
        trailers_data: *const u8,
        trailers_size: usize,
        timeout_milliseconds: u32,
        return_callout_id: *mut u32,
    ) -> u32;
    fn proxy_call_foreign_function(
        function_name_data: *const u8,
        function_name_size: usize,
        arguments_data: *const u8,
        arguments_size: usize,
        return_results_data: *mut *mut u8,
        return_results_size: *mut usize,
    ) -> u32;
    fn proxy_register_shared_queue(
        queue_name_data: *const u8,
        queue_name_size: usize,
        return_queue_id: *mut u32,
    ) -> u32;
    fn proxy_resolve_shared_queue(
        vm_id_data: *const u8,
        vm_id_size: usize,
        queue_name_data: *const u8,
        queue_name_size: usize,
        return_queue_id: *mut u32,
    ) -> u32;
    fn proxy_dequeue_shared_queue(
        queue_id: u32,
        return_payload_data: *mut *mut u8,
        return_payload_size: *mut usize,
    ) -> u32;
    fn proxy_enqueue_shared_queue(queue_id: u32, payload_data: *const u8, payload_size: usize)
    -> u32;
    fn proxy_get_shared_data(
        key_data: *const u8,
        key_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
        return_cas: *mut u32,
    ) -> u32;
    fn proxy_set_shared_data(
        key_data: *const u8,
        key_size: usize,
        value_data: *const u8,
        value_size: usize,
        cas: u32,
    ) -> u32;
    fn proxy_get_property(
        path_data: *const u8,
        path_size: usize,
        return_value_data: *mut *mut u8,
        return_value_size: *mut usize,
    ) -> u32;
    fn proxy_set_property(
        path_data: *const u8,
        path_size: usize,
        value_data: *const u8,
        value_size: usize,
    ) -> u32;
    fn proxy_done() -> u32;
}

#[inline]
fn check(code: u32) -> Result<(), HostError> {
    Status::from_raw(code).into_result()
}

/// Issue a call that returns a host-allocated buffer and adopt it.
fn returned_bytes(call: impl FnOnce(*mut *mut u8, *mut usize) -> u32) -> Result<Vec<u8>, HostError> {
    let mut data: *mut u8 = null_mut();
    let mut size: usize = 0;
    check(call(&raw mut data, &raw mut size))?;
    // SAFETY: on success the host filled `size` bytes of a block obtained
    // from `proxy_on_memory_allocate(size)`.
    Ok(unsafe { take_host_bytes(data, size) })
}

/// [`Host`] backed by the proxy-wasm imports.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbiHost;

impl Host for AbiHost {
    fn log(&mut self, level: LogLevel, message: &str) -> Result<(), HostError> {
        check(unsafe { proxy_log(level as u32, abi_ptr(message.as_bytes()), message.len()) })
    }

    fn set_tick_period_milliseconds(&mut self, period: u32) -> Result<(), HostError> {
        check(unsafe { proxy_set_tick_period_milliseconds(period) })
    }

    fn get_buffer_bytes(
        &mut self,
        buffer: BufferType,
        start: usize,
        max_size: usize,
    ) -> Result<Vec<u8>, HostError> {
        returned_bytes(|data, size| unsafe {
            proxy_get_buffer_bytes(buffer as u32, start, max_size, data, size)
        })
    }

    fn set_buffer_bytes(
        &mut self,
        buffer: BufferType,
        start: usize,
        size: usize,
        data: &[u8],
    ) -> Result<(), HostError> {
        check(unsafe {
            proxy_set_buffer_bytes(buffer as u32, start, size, abi_ptr(data), data.len())
        })
    }

    fn get_header_map_pairs(&mut self, map: MapType) -> Result<Vec<u8>, HostError> {
        returned_bytes(|data, size| unsafe { proxy_get_header_map_pairs(map as u32, data, size) })
    }

    fn set_header_map_pairs(&mut self, map: MapType, encoded: &[u8]) -> Result<(), HostError> {
        check(unsafe { proxy_set_header_map_pairs(map as u32, abi_ptr(encoded), encoded.len()) })
    }

    fn get_header_map_value(&mut self, map: MapType, key: &str) -> Result<Vec<u8>, HostError> {
        returned_bytes(|data, size| unsafe {
            proxy_get_header_map_value(map as u32, abi_ptr(key.as_bytes()), key.len(), data, size)
        })
    }

    fn replace_header_map_value(
        &mut self,
        map: MapType,
        key: &str,
        value: &str,
    ) -> Result<(), HostError> {
        check(unsafe {
            proxy_replace_header_map_value(
                map as u32,
                abi_ptr(key.as_bytes()),
                key.len(),
                abi_ptr(value.as_bytes()),
                value.len(),
            )
        })
    }

    fn remove_header_map_value(&mut self, map: MapType, key: &str) -> Result<(), HostError> {
        check(unsafe { proxy_remove_header_map_value(map as u32, abi_ptr(key.as_bytes()), key.len()) })
    }

    fn add_header_map_value(&mut self, map: MapType, key: &str, value: &str) -> Result<(), HostError> {
        check(unsafe {
            proxy_add_header_map_value(
                map as u32,
                abi_ptr(key.as_bytes()),
                key.len(),
                abi_ptr(value.as_bytes()),
                value.len(),
            )
        })
    }

    fn continue_stream(&mut self, stream: StreamType) -> Result<(), HostError> {
        check(unsafe { proxy_continue_stream(stream as u32) })
    }

    fn close_stream(&mut self, stream: StreamType) -> Result<(), HostError> {
        check(unsafe { proxy_close_stream(stream as u32) })
    }

    fn send_local_response(
        &mut self,
        status_code: u32,
        details: &str,
        body: &[u8],
        encoded_headers: &[u8],
        grpc_status: i32,
    ) -> Result<(), HostError> {
        check(unsafe {
            proxy_send_local_response(
                status_code,
                abi_ptr(details.as_bytes()),
                details.len(),
                abi_ptr(body),
                body.len(),
                abi_ptr(encoded_headers),
                encoded_headers.len(),
                grpc_status,
            )
        })
    }

    fn http_call(
        &mut self,
        upstream: &str,
        encoded_headers: &[u8],
        body: &[u8],
        encoded_trailers: &[u8],
        timeout_milliseconds: u32,
    ) -> Result<u32, HostError> {
        let mut callout_id = 0;
        check(unsafe {
            proxy_http_call(
                abi_ptr(upstream.as_bytes()),
                upstream.len(),
                abi_ptr(encoded_headers),
                encoded_headers.len(),
                abi_ptr(body),
                body.len(),
                abi_ptr(encoded_trailers),
                encoded_trailers.len(),
                timeout_milliseconds,
                &mut callout_id,
            )
        })?;
        Ok(callout_id)
    }

    fn call_foreign_function(&mut self, name: &str, arguments: &[u8]) -> Result<Vec<u8>, HostError> {
        returned_bytes(|data, size| unsafe {
            proxy_call_foreign_function(
                abi_ptr(name.as_bytes()),
                name.len(),
                abi_ptr(arguments),
                arguments.len(),
                data,
                size,
            )
        })
    }

    fn register_shared_queue(&mut self, name: &str) -> Result<u32, HostError> {
        let mut queue_id = 0;
        check(unsafe {
            proxy_register_shared_queue(abi_ptr(name.as_bytes()), name.len(), &mut queue_id)
        })?;
        Ok(queue_id)
    }

    fn resolve_shared_queue(&mut self, vm_id: &str, name: &str) -> Result<u32, HostError> {
        let mut queue_id = 0;
        check(unsafe {
            proxy_resolve_shared_queue(
                abi_ptr(vm_id.as_bytes()),
                vm_id.len(),
                abi_ptr(name.as_bytes()),
                name.len(),
                &mut queue_id,
            )
        })?;
        Ok(queue_id)
    }

    fn dequeue_shared_queue(&mut self, queue_id: u32) -> Result<Vec<u8>, HostError> {
        returned_bytes(|data, size| unsafe { proxy_dequeue_shared_queue(queue_id, data, size) })
    }

    fn enqueue_shared_queue(&mut self, queue_id: u32, payload: &[u8]) -> Result<(), HostError> {
        check(unsafe { proxy_enqueue_shared_queue(queue_id, abi_ptr(payload), payload.len()) })
    }

    fn get_shared_data(&mut self, key: &str) -> Result<(Vec<u8>, u32), HostError> {
        let mut cas = 0;
        let value = returned_bytes(|data, size| unsafe {
            proxy_get_shared_data(abi_ptr(key.as_bytes()), key.len(), data, size, &mut cas)
        })?;
        Ok((value, cas))
    }

    fn set_shared_data(&mut self, key: &str, value: &[u8], cas: u32) -> Result<(), HostError> {
        check(unsafe {
            proxy_set_shared_data(
                abi_ptr(key.as_bytes()),
                key.len(),
                abi_ptr(value),
                value.len(),
                cas,
            )
        })
    }

    fn get_property(&mut self, path: &[u8]) -> Result<Vec<u8>, HostError> {
        returned_bytes(|data, size| unsafe {
            proxy_get_property(abi_ptr(path), path.len(), data, size)
        })
    }

    fn set_property(&mut self, path: &[u8], value: &[u8]) -> Result<(), HostError> {
        check(unsafe { proxy_set_property(abi_ptr(path), path.len(), abi_ptr(value), value.len()) })
    }

    fn done(&mut self) -> Result<(), HostError> {
        check(unsafe { proxy_done() })
    }
}
