//! `Runtime`: the process-wide state threaded through the evaluator
//! (spec.md §9 "Global mutable state", SPEC_FULL.md §10.3, §11).
//!
//! Two singletons would otherwise be true statics: the manually-freed-
//! pointer registry and the builtin registry. Both live here instead, so a
//! host can run more than one independent Hemlock runtime in a process
//! (tests do exactly this) without them trampling each other.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hemlock_core::registry::ManualFreeRegistry;

use crate::builtins::BuiltinRegistry;

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Capacity used when `channel()` is called with no argument.
    pub channel_default_capacity: usize,
    /// Diagnostics cap on the manually-freed-pointer registry; `None` is
    /// unbounded (SPEC_FULL.md §10.3).
    pub max_manual_free_registry_entries: Option<usize>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel_default_capacity: 0,
            max_manual_free_registry_entries: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeStats {
    pub live_task_count: usize,
    pub open_channel_count: usize,
    pub manually_freed_count: usize,
    pub free_hazard_count: u64,
}

/// Shared runtime state, cheap to clone (it's a handful of `Arc`s) and
/// threaded through every task's evaluator context (spec.md §9).
#[derive(Clone)]
pub struct Runtime {
    config: RuntimeConfig,
    registry: Arc<ManualFreeRegistry>,
    builtins: Arc<BuiltinRegistry>,
    live_tasks: Arc<AtomicUsize>,
    open_channels: Arc<AtomicUsize>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            registry: Arc::new(ManualFreeRegistry::with_capacity(
                config.max_manual_free_registry_entries,
            )),
            builtins: Arc::new(BuiltinRegistry::with_standard_library()),
            live_tasks: Arc::new(AtomicUsize::new(0)),
            open_channels: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> RuntimeConfig {
        self.config
    }

    pub fn registry(&self) -> &ManualFreeRegistry {
        &self.registry
    }

    pub fn builtins(&self) -> &BuiltinRegistry {
        &self.builtins
    }

    pub fn on_task_spawned(&self) {
        self.live_tasks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_task_finished(&self) {
        self.live_tasks.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn on_channel_opened(&self) {
        self.open_channels.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_channel_closed(&self) {
        self.open_channels.fetch_sub(1, Ordering::Relaxed);
    }

    /// Read-only diagnostics snapshot (SPEC_FULL.md §11), grounded in the
    /// teacher's `try_lock`-based `channel_stats()`/scheduler counters:
    /// never blocks, never panics under contention.
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            live_task_count: self.live_tasks.load(Ordering::Relaxed),
            open_channel_count: self.open_channels.load(Ordering::Relaxed),
            manually_freed_count: self.registry.try_len().unwrap_or(0),
            free_hazard_count: self.registry.hazard_count(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}
