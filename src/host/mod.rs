//! The seam between plugin-facing calls and the raw host ABI.
//!
//! [`Host`] mirrors the host's import surface at the wire level: map
//! arguments and results are already-encoded byte buffers, and every call
//! reports failure as a [`HostError`]. On `wasm32` the installed host is
//! [`abi::AbiHost`], which issues the real foreign calls. On other targets no
//! host exists until one is installed with [`set_host`]; every method then
//! reports [`HostError::Unimplemented`].
//!
//! # Module Organization
//!
//! - `abi`: Raw `extern "C"` imports and [`abi::AbiHost`] (wasm32 only)
//! - [`memory`]: Pointer/length helpers for crossing the boundary

#[cfg(target_arch = "wasm32")]
pub mod abi;
pub mod memory;

use std::cell::RefCell;

use crate::error::HostError;
use crate::types::{BufferType, LogLevel, MapType, StreamType};

/// Wire-level host capabilities.
///
/// Every method defaults to [`HostError::Unimplemented`], so an
/// implementation (or a test double) only provides what it supports.
#[allow(unused_variables)]
pub trait Host {
    fn log(&mut self, level: LogLevel, message: &str) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn set_tick_period_milliseconds(&mut self, period: u32) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn get_buffer_bytes(
        &mut self,
        buffer: BufferType,
        start: usize,
        max_size: usize,
    ) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unimplemented)
    }

    /// Replace `size` bytes at `start` with `data`.
    fn set_buffer_bytes(
        &mut self,
        buffer: BufferType,
        start: usize,
        size: usize,
        data: &[u8],
    ) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    /// Returns the map in the encoding of [`crate::codec::encode_map`].
    fn get_header_map_pairs(&mut self, map: MapType) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unimplemented)
    }

    fn set_header_map_pairs(&mut self, map: MapType, encoded: &[u8]) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn get_header_map_value(&mut self, map: MapType, key: &str) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unimplemented)
    }

    fn replace_header_map_value(
        &mut self,
        map: MapType,
        key: &str,
        value: &str,
    ) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn remove_header_map_value(&mut self, map: MapType, key: &str) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn add_header_map_value(&mut self, map: MapType, key: &str, value: &str) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn continue_stream(&mut self, stream: StreamType) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn close_stream(&mut self, stream: StreamType) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn send_local_response(
        &mut self,
        status_code: u32,
        details: &str,
        body: &[u8],
        encoded_headers: &[u8],
        grpc_status: i32,
    ) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    /// Start an outbound HTTP call and return its callout id.
    fn http_call(
        &mut self,
        upstream: &str,
        encoded_headers: &[u8],
        body: &[u8],
        encoded_trailers: &[u8],
        timeout_milliseconds: u32,
    ) -> Result<u32, HostError> {
        Err(HostError::Unimplemented)
    }

    fn call_foreign_function(&mut self, name: &str, arguments: &[u8]) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unimplemented)
    }

    fn register_shared_queue(&mut self, name: &str) -> Result<u32, HostError> {
        Err(HostError::Unimplemented)
    }

    fn resolve_shared_queue(&mut self, vm_id: &str, name: &str) -> Result<u32, HostError> {
        Err(HostError::Unimplemented)
    }

    fn dequeue_shared_queue(&mut self, queue_id: u32) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unimplemented)
    }

    fn enqueue_shared_queue(&mut self, queue_id: u32, payload: &[u8]) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    /// Returns the value and its CAS token.
    fn get_shared_data(&mut self, key: &str) -> Result<(Vec<u8>, u32), HostError> {
        Err(HostError::Unimplemented)
    }

    /// Write `value`; a non-zero `cas` must match the current token.
    fn set_shared_data(&mut self, key: &str, value: &[u8], cas: u32) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    /// `path` is encoded with [`crate::codec::encode_property_path`].
    fn get_property(&mut self, path: &[u8]) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unimplemented)
    }

    fn set_property(&mut self, path: &[u8], value: &[u8]) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }

    fn done(&mut self) -> Result<(), HostError> {
        Err(HostError::Unimplemented)
    }
}

/// Placeholder host for targets without the proxy ABI.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHost;

impl Host for DetachedHost {}

thread_local! {
    static HOST: RefCell<Box<dyn Host>> = RefCell::new(default_host());
}

#[cfg(target_arch = "wasm32")]
fn default_host() -> Box<dyn Host> {
    Box::new(abi::AbiHost)
}

#[cfg(not(target_arch = "wasm32"))]
fn default_host() -> Box<dyn Host> {
    Box::new(DetachedHost)
}

/// Install `host` for this thread and return the previous one.
pub fn set_host(host: impl Host + 'static) -> Box<dyn Host> {
    HOST.with(|h| h.replace(Box::new(host)))
}

/// Run `f` against the installed host.
///
/// Host calls never re-enter the guest, so the handle is never borrowed
/// twice during normal operation.
pub fn with_host<R>(f: impl FnOnce(&mut dyn Host) -> R) -> R {
    HOST.with(|h| f(h.borrow_mut().as_mut()))
}

/// Like [`with_host`], but returns `None` instead of re-borrowing a host
/// that is already in use.
pub fn try_with_host<R>(f: impl FnOnce(&mut dyn Host) -> R) -> Option<R> {
    HOST.with(|h| h.try_borrow_mut().ok().map(|mut host| f(host.as_mut())))
}
