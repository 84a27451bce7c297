//! Hemlock Core: value-agnostic primitives for the Hemlock execution core
//!
//! This crate provides the foundation that `hemlock-runtime` builds its
//! concrete `Value` type and heap objects on top of:
//!
//! - `handle`: `Handle<T>`, an atomically refcounted smart pointer with an
//!   explicit `retain`/`release` vocabulary plus a `free()` escape hatch for
//!   Hemlock's manual-memory-management story.
//! - `registry`: the process-wide manually-freed-pointer registry that lets
//!   manual `free()` coexist with reference counting without double-destructing.
//! - `numeric`: integer width enforcement, arithmetic promotion rules, and
//!   rune (code point) validation — the scalar half of §4.1's contract.
//! - `error`: the error taxonomy every throwable Hemlock error is built from.
//!
//! Deliberately absent: the `Value` enum itself and all heap object
//! definitions (`StringObj`, `ArrayObj`, ...). Those are Hemlock-specific and
//! live in `hemlock-runtime`, which depends on this crate rather than the
//! other way around.

pub mod error;
pub mod handle;
pub mod numeric;
pub mod registry;

pub use error::{ErrorKind, RuntimeError, Thrown};
pub use handle::Handle;
pub use numeric::IntWidth;
pub use registry::ManualFreeRegistry;
