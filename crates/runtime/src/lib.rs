//! Hemlock Runtime: the tree-walking execution core for the Hemlock
//! scripting language.
//!
//! Built on `hemlock-core`'s value-agnostic primitives (`Handle<T>`, the
//! manually-freed-pointer registry, numeric width checks, the error
//! taxonomy), this crate supplies everything that needs to know about
//! `Value` itself:
//!
//! - `value`: the tagged-union `Value` type and its coercion/printing/
//!   equality contract (§4.1).
//! - `heap`: the eight heap object kinds (`String`, `Buffer`, `Array`,
//!   `Object`, `Function`, `Task`, `Channel`, `File`), each owning its
//!   contents behind a `Mutex` taken briefly per method call — no
//!   cross-call atomicity is promised (a script can still observe another
//!   task's call land in between two of its own), but no individual call
//!   races on the underlying allocation.
//! - `environment`: the scoped variable-binding chain (§4.3).
//! - `ast`: the expression/statement tree the evaluator walks.
//! - `evaluator`: expression/statement evaluation, call dispatch, `defer`,
//!   `try`/`catch`/`finally` (§4.4, §4.8).
//! - `methods`: per-type method tables plus property/index dispatch (§4.5).
//! - `task`/`channel`/`memory`: the runtime intrinsics (`spawn`, `channel`,
//!   `join`, `detach`, `free`) that need access to process-wide state the
//!   ordinary builtin-function signature can't carry.
//! - `builtins`: the standard-library registry (`print`, `type_of`, ...).
//! - `json`: the `serialize`/`deserialize` builtins, gated behind the
//!   `report-json` feature.
//! - `runtime`: `Runtime`/`RuntimeConfig`/`RuntimeStats`, the value threaded
//!   through every evaluation call instead of process-wide statics (§9).

pub mod ast;
pub mod builtins;
pub mod channel;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod heap;
#[cfg(feature = "report-json")]
pub mod json;
pub mod memory;
pub mod methods;
pub mod ptr_alloc;
pub mod runtime;
pub mod task;
pub mod value;

pub use environment::Environment;
pub use error::{RuntimeError, Thrown};
pub use evaluator::{eval_expr, exec_program, Signal};
pub use runtime::{Runtime, RuntimeConfig, RuntimeStats};
pub use value::{Value, ValueTag};
