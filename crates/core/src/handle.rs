//! `Handle<T>`: an atomically refcounted smart pointer with an explicit
//! `retain`/`release` vocabulary and a `free()` escape hatch.
//!
//! This plays the role `Arc<T>` plays in the teacher's `ChannelData`/
//! `VariantData` handles, but a plain `Arc` cannot express Hemlock's manual
//! `free()`: `Arc::try_unwrap` consumes the `Arc`, while spec.md §4.2 needs
//! to destruct the payload in place while the caller's binding — and its
//! eventual `Drop` — are still around. `Handle<T>` is a small hand-rolled
//! refcounted box for exactly that reason.
//!
//! Normal refcounting is handled by `Clone` (retain) and `Drop` (release),
//! so scopes, containers, and call frames, which already use ordinary Rust
//! ownership, thread the refcount for free. `retain()`/`release()` are also
//! exposed directly because spec.md §4.2 names them as the contract other
//! components are written against.

use std::cell::UnsafeCell;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::RuntimeError;

struct HandleInner<T> {
    strong: AtomicUsize,
    /// Set by `free()`; checked by `get()`/`try_get()` so a dangling access
    /// fails with a catchable error instead of touching freed memory.
    freed: AtomicBool,
    value: UnsafeCell<Option<T>>,
}

/// A strong, reference-counted pointer to a heap object (spec.md GLOSSARY).
pub struct Handle<T> {
    ptr: NonNull<HandleInner<T>>,
}

// Safety: Handle<T> only exposes `T` through `&T` (never `&mut T` beyond
// construction/free), and the refcount plus freed flag are atomics. Sound to
// share across threads exactly when T itself is Send + Sync, mirroring the
// bound the teacher places on its Arc-based Value handles.
unsafe impl<T: Send + Sync> Send for Handle<T> {}
unsafe impl<T: Send + Sync> Sync for Handle<T> {}

impl<T> Handle<T> {
    /// Allocate a new handle with an initial strong count of 1.
    pub fn new(value: T) -> Self {
        let inner = Box::new(HandleInner {
            strong: AtomicUsize::new(1),
            freed: AtomicBool::new(false),
            value: UnsafeCell::new(Some(value)),
        });
        Handle {
            ptr: NonNull::from(Box::leak(inner)),
        }
    }

    #[inline]
    fn inner(&self) -> &HandleInner<T> {
        // Safety: self.ptr is always a live HandleInner allocation for as
        // long as any Handle referencing it exists (the Drop impl only
        // deallocates after the strong count reaches zero).
        unsafe { self.ptr.as_ref() }
    }

    /// Current strong reference count.
    pub fn strong_count(&self) -> usize {
        self.inner().strong.load(Ordering::Acquire)
    }

    /// Stable identity of the backing allocation, used for pointer-identity
    /// equality (functions/tasks/channels/files) and the manually-freed
    /// registry.
    pub fn address(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    /// Explicit retain, matching spec.md §4.2 vocabulary. Equivalent to
    /// `Clone::clone`.
    pub fn retain(&self) -> Self {
        self.inner().strong.fetch_add(1, Ordering::Relaxed);
        Handle { ptr: self.ptr }
    }

    /// Explicit release, matching spec.md §4.2 vocabulary. Equivalent to
    /// dropping the handle.
    pub fn release(self) {
        drop(self);
    }

    /// Borrow the payload, failing if it has already been manually freed.
    ///
    /// Concurrent `free()` from another task while this borrow is alive is
    /// the documented hazard from spec.md §5 ("heap objects' contents are
    /// not protected"); this guards against touching memory that is gone,
    /// not against racing mutation of live memory.
    pub fn get(&self) -> Result<&T, RuntimeError> {
        if self.inner().freed.load(Ordering::Acquire) {
            return Err(RuntimeError::memory("use of a manually-freed handle"));
        }
        // Safety: freed == false guarantees the Option is still Some and
        // nothing else is concurrently taking it (free() sets freed first
        // is wrong order — see free() below, which takes before setting).
        let slot = unsafe { &*self.inner().value.get() };
        slot.as_ref()
            .ok_or_else(|| RuntimeError::memory("use of a manually-freed handle"))
    }

    /// True if `other` is the same heap object (pointer identity), used for
    /// function/task/channel/file equality per spec.md §4.1.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.ptr == b.ptr
    }

    /// Manually destruct the payload now, provided this is the only live
    /// reference (spec.md §4.2's corrected refcount-<=1 contract, not the
    /// source's unconditional zero-out — see SPEC_FULL.md §12).
    ///
    /// On success the object's contents are dropped immediately and its
    /// address is recorded in `registry` so a subsequent `release` (this
    /// handle's own `Drop`, or a stale alias elsewhere) does not attempt to
    /// destruct it again.
    pub fn free(&self, registry: &crate::registry::ManualFreeRegistry) -> Result<(), RuntimeError> {
        let inner = self.inner();
        if inner.strong.load(Ordering::Acquire) > 1 {
            return Err(RuntimeError::memory(
                "free: handle is shared (refcount > 1)",
            ));
        }
        // Safety: refcount <= 1 and freed not yet set means we are the
        // exclusive owner of this slot right now.
        let taken = unsafe { (*inner.value.get()).take() };
        inner.freed.store(true, Ordering::Release);
        drop(taken);
        registry.mark_freed(self.address());
        tracing::debug!("manually freed heap object at {:#x}", self.address());
        Ok(())
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        self.retain()
    }
}

impl<T> Drop for Handle<T> {
    fn drop(&mut self) {
        let inner = self.inner();
        if inner.strong.fetch_sub(1, Ordering::Release) != 1 {
            return;
        }
        std::sync::atomic::fence(Ordering::Acquire);
        // Safety: strong count just reached zero, so no other Handle can
        // observe or race this deallocation. If `free()` already ran, the
        // UnsafeCell holds None and this drop of the Box is a no-op beyond
        // freeing the allocation itself.
        unsafe {
            drop(Box::from_raw(self.ptr.as_ptr()));
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Ok(v) => f.debug_tuple("Handle").field(v).finish(),
            Err(_) => write!(f, "Handle(<freed>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ManualFreeRegistry;

    #[test]
    fn retain_increments_and_release_decrements() {
        let h = Handle::new(42i64);
        assert_eq!(h.strong_count(), 1);
        let h2 = h.retain();
        assert_eq!(h.strong_count(), 2);
        h2.release();
        assert_eq!(h.strong_count(), 1);
    }

    #[test]
    fn clone_and_drop_balance_refcount() {
        let h = Handle::new(String::from("hi"));
        {
            let _h2 = h.clone();
            assert_eq!(h.strong_count(), 2);
        }
        assert_eq!(h.strong_count(), 1);
    }

    #[test]
    fn free_requires_exclusive_ownership() {
        let registry = ManualFreeRegistry::new();
        let h = Handle::new(vec![1, 2, 3]);
        let _h2 = h.clone();
        let err = h.free(&registry).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Memory);
    }

    #[test]
    fn free_succeeds_when_exclusive_and_marks_registry() {
        let registry = ManualFreeRegistry::new();
        let h = Handle::new(vec![1, 2, 3]);
        let addr = h.address();
        h.free(&registry).unwrap();
        assert!(registry.is_freed(addr));
        assert!(h.get().is_err());
    }

    #[test]
    fn drop_after_free_does_not_double_free() {
        let registry = ManualFreeRegistry::new();
        let h = Handle::new(vec![1, 2, 3]);
        h.free(&registry).unwrap();
        drop(h); // must not panic/UB; taken value already gone
    }

    #[test]
    fn ptr_eq_identifies_same_allocation() {
        let h = Handle::new(1i64);
        let h2 = h.clone();
        let other = Handle::new(1i64);
        assert!(Handle::ptr_eq(&h, &h2));
        assert!(!Handle::ptr_eq(&h, &other));
    }
}
