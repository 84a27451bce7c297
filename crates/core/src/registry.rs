//! The manually-freed-pointer registry (spec.md §4.2, GLOSSARY).
//!
//! A process-wide, mutex-protected set of addresses that were destructed by
//! an explicit `free()`. `release()` (ordinary `Drop`) consults it so a
//! stale alias to an already-freed address cannot trigger a second
//! destruction. Modeled directly on the teacher's channel registry
//! (`CHANNEL_REGISTRY: Mutex<Option<HashMap<...>>>` in `channel.rs`) and its
//! lock-free-read diagnostics counters in `scheduler.rs`.
//!
//! `Handle<T>::free` already prevents double-drop of its own payload via the
//! `UnsafeCell<Option<T>>` dance (see `handle.rs`), so in-process this
//! registry's hard safety job is done. Its remaining job, per spec.md §9, is
//! to make the documented hazard *observable*: count how often a release
//! path notices an address that was already freed, so a host program can
//! detect the race instead of it silently vanishing.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::warn;

/// Process-wide registry of manually-freed heap addresses.
///
/// Construct one per `Runtime` (see `hemlock-runtime`'s `Runtime` type) —
/// spec.md §9 explicitly asks implementers to avoid reliance on true statics
/// beyond constant tables, threading a `Runtime` value through instead.
pub struct ManualFreeRegistry {
    freed: Mutex<HashSet<usize>>,
    /// Optional cap (diagnostics only — never rejects a free) recorded at
    /// construction; exceeding it just stops recording new addresses while
    /// `hazard_hits` keeps counting.
    cap: Option<usize>,
    /// Number of times `mark_freed` observed the registry already full, or
    /// `note_hazard` was called because a stale handle observed an address
    /// that was already freed.
    hazard_hits: AtomicU64,
}

impl ManualFreeRegistry {
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    pub fn with_capacity(cap: Option<usize>) -> Self {
        Self {
            freed: Mutex::new(HashSet::new()),
            cap,
            hazard_hits: AtomicU64::new(0),
        }
    }

    /// Record that the object at `address` was just manually freed.
    pub fn mark_freed(&self, address: usize) {
        let mut guard = self
            .freed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cap) = self.cap {
            if guard.len() >= cap && !guard.contains(&address) {
                warn!("manual-free registry full ({cap} entries), dropping hazard tracking for address {address:#x}");
                self.hazard_hits.fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        guard.insert(address);
    }

    /// Whether `address` has been manually freed.
    pub fn is_freed(&self, address: usize) -> bool {
        let guard = self
            .freed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.contains(&address)
    }

    /// Record that a release path observed an address already in the
    /// registry — the race spec.md §9 documents as "a hazard the language
    /// exposes by choice", not a bug to fix in the implementation.
    pub fn note_hazard(&self) {
        warn!("release observed an address already recorded as manually freed");
        self.hazard_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of entries currently recorded (best-effort; see `try_len`).
    pub fn len(&self) -> usize {
        let guard = self
            .freed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking size read for diagnostics contexts that must not stall
    /// behind a contended lock (mirrors `channel_count()`'s `try_lock` use).
    pub fn try_len(&self) -> Option<usize> {
        self.freed.try_lock().ok().map(|g| g.len())
    }

    pub fn hazard_count(&self) -> u64 {
        self.hazard_hits.load(Ordering::Relaxed)
    }
}

impl Default for ManualFreeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_and_query() {
        let reg = ManualFreeRegistry::new();
        assert!(!reg.is_freed(0x1000));
        reg.mark_freed(0x1000);
        assert!(reg.is_freed(0x1000));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn capacity_caps_recording_but_counts_hazard() {
        let reg = ManualFreeRegistry::with_capacity(Some(1));
        reg.mark_freed(1);
        reg.mark_freed(2);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.hazard_count(), 1);
    }

    #[test]
    fn note_hazard_increments_counter() {
        let reg = ManualFreeRegistry::new();
        reg.note_hazard();
        reg.note_hazard();
        assert_eq!(reg.hazard_count(), 2);
    }
}
