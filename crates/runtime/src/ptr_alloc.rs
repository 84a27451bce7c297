//! Raw `Ptr` allocation, matching `Value::Ptr`'s "address + size hint, no
//! Rust-level ownership" shape (spec.md §3, §4.2 "For `Ptr`, `free` simply
//! frees the raw allocation and records it").
//!
//! Hemlock's `Ptr` is the one heap-adjacent value with no refcount at all —
//! a raw allocation the source language hands out and takes back by
//! address. We back it with `Vec<u8>` turned into a raw pointer via
//! `Box<[u8]>::into_raw`/`Box::from_raw`, matching the teacher's own use of
//! raw pointers at FFI boundaries (`Value::Closure::fn_ptr` stored as
//! `usize`).

use hemlock_core::error::RuntimeError;
use hemlock_core::registry::ManualFreeRegistry;

/// Allocate `size` zeroed bytes and return the `(address, size)` pair a
/// `Value::Ptr` carries.
pub fn alloc(size: usize) -> (usize, usize) {
    let boxed: Box<[u8]> = vec![0u8; size].into_boxed_slice();
    let raw = Box::into_raw(boxed);
    (raw as *mut u8 as usize, size)
}

/// Free a raw pointer previously returned by `alloc`, recording its address
/// in the manually-freed registry so a stale `Ptr` alias is caught by
/// `release`-adjacent paths the same way heap handles are.
///
/// # Safety-adjacent note
/// There is no refcount for `Ptr` — the language trusts the caller not to
/// retain a second `Ptr` value over the same address and free through it
/// again. Calling this on an address not returned by `alloc`, or on one
/// already freed, is undefined behavior; the registry check below catches
/// the common case of a second `free` through an aliased `Value::Ptr`.
pub unsafe fn free(address: usize, size: usize, registry: &ManualFreeRegistry) -> Result<(), RuntimeError> {
    if registry.is_freed(address) {
        registry.note_hazard();
        return Err(RuntimeError::memory(format!(
            "double free of pointer {address:#x}"
        )));
    }
    let slice_ptr = std::ptr::slice_from_raw_parts_mut(address as *mut u8, size);
    drop(unsafe { Box::from_raw(slice_ptr) });
    registry.mark_freed(address);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_then_free_round_trips() {
        let registry = ManualFreeRegistry::new();
        let (addr, size) = alloc(16);
        assert_ne!(addr, 0);
        unsafe {
            free(addr, size, &registry).unwrap();
        }
        assert!(registry.is_freed(addr));
    }

    #[test]
    fn double_free_is_rejected() {
        let registry = ManualFreeRegistry::new();
        let (addr, size) = alloc(8);
        unsafe {
            free(addr, size, &registry).unwrap();
        }
        let err = unsafe { free(addr, size, &registry) };
        assert!(err.is_err());
    }
}
