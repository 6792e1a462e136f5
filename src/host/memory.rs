//! Guest memory handling at the host boundary.
//!
//! Outgoing data is passed as a pointer/length pair borrowed for the
//! duration of one host call. Incoming data is written by the host into a
//! block it first requested through `proxy_on_memory_allocate`; the guest
//! then adopts that block as a `Vec<u8>` of exactly the declared length.

use std::ptr::NonNull;

/// Pointer to pass for `data`.
///
/// An empty slice yields a dangling, well-aligned, non-null sentinel. The
/// host never dereferences it because the accompanying length is zero.
#[inline]
pub fn abi_ptr(data: &[u8]) -> *const u8 {
    if data.is_empty() {
        NonNull::<u8>::dangling().as_ptr()
    } else {
        data.as_ptr()
    }
}

/// Allocate `size` bytes for the host to write into.
///
/// Ownership passes to the host until the block comes back through
/// [`take_host_bytes`] with the same size.
pub fn allocate(size: usize) -> *mut u8 {
    let mut block: Vec<u8> = Vec::with_capacity(size);
    let ptr = block.as_mut_ptr();
    std::mem::forget(block);
    ptr
}

/// Adopt a host-filled block as an owned vector.
///
/// A null pointer or zero length yields an empty vector without touching
/// memory.
///
/// # Safety
///
/// A non-null `ptr` with non-zero `len` must come from [`allocate`] called
/// with exactly `len`, and the host must have initialized all `len` bytes.
pub unsafe fn take_host_bytes(ptr: *mut u8, len: usize) -> Vec<u8> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    // SAFETY: `ptr` was allocated by `allocate(len)` with capacity `len` and
    // the host wrote `len` initialized bytes.
    unsafe { Vec::from_raw_parts(ptr, len, len) }
}
