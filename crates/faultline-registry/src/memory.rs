//! Allocation through the calling thread's default allocator.
//!
//! Every call resolves the current fixture afresh, so a block must be
//! freed under the same fixture that allocated it.

use faultline_core::{fatal, Ptr, Violation};

use crate::fixture::default_allocator;
use crate::registry::AllocatorRef;

fn resolve() -> Option<AllocatorRef> {
    match default_allocator() {
        Ok(allocator) => Some(allocator),
        Err(e) => {
            log::error!(target: "faultline::memory", "no default allocator: {e}");
            None
        }
    }
}

/// Allocate `n` bytes. `None` on exhaustion or for `n == 0`.
pub fn allocate(n: usize) -> Option<Ptr> {
    resolve()?.allocate(n)
}

/// Resize a block, with the null conventions of [`AllocatorRef::resize`].
pub fn resize(p: Option<Ptr>, n: usize) -> Option<Ptr> {
    resolve()?.resize(p, n)
}

/// Release a block. `None` is a no-op.
pub fn free(p: Option<Ptr>) {
    if p.is_none() {
        return;
    }
    if let Some(allocator) = resolve() {
        allocator.free(p);
    }
}

/// Run `f` over the bytes of `p`.
pub fn with_bytes<R>(p: Ptr, f: impl FnOnce(&[u8]) -> R) -> R {
    match resolve() {
        Some(allocator) => allocator.with_payload(p, f),
        None => fatal(Violation::UnknownPointer { ptr: p }),
    }
}

/// Run `f` over the mutable bytes of `p`.
pub fn with_bytes_mut<R>(p: Ptr, f: impl FnOnce(&mut [u8]) -> R) -> R {
    match resolve() {
        Some(allocator) => allocator.with_payload_mut(p, f),
        None => fatal(Violation::UnknownPointer { ptr: p }),
    }
}
