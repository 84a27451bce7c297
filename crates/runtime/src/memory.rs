//! `free(v)`: the manual-free intrinsic (spec.md §4.2).
//!
//! Only `Buffer`/`Array`/`Object` handles and raw `Ptr` allocations are
//! manually freeable; permitted only while the argument is the sole live
//! reference (refcount ≤ 1) — the corrected contract spec.md calls out in
//! its "Open question (from source)", not the source's unconditional
//! zero-out.

use hemlock_core::error::RuntimeError;

use crate::error::Thrown;
use crate::runtime::Runtime;
use crate::value::Value;

pub fn free(value: &Value, runtime: &Runtime) -> Result<(), Thrown> {
    let result = match value {
        Value::Buffer(h) => h.free(runtime.registry()),
        Value::Array(h) => h.free(runtime.registry()),
        Value::Object(h) => h.free(runtime.registry()),
        Value::Ptr { address, size_hint } => unsafe { crate::ptr_alloc::free(*address, *size_hint, runtime.registry()) },
        other => return Err(RuntimeError::type_error(format!("cannot free a {:?}", other.tag())).into()),
    };
    if let Err(ref e) = result {
        tracing::warn!("free() rejected: {e}");
    }
    result.map_err(Into::into)
}
