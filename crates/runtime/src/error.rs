//! Wires `hemlock_core`'s generic error taxonomy to the concrete `Value`
//! type (SPEC_FULL.md §10.1).
//!
//! Every fallible evaluator/builtin operation returns `Result<T, Thrown>`.
//! A `RuntimeError` from `hemlock-core` converts to a `Thrown` by wrapping
//! itself as a small `Value::Object` carrying `kind` and `message` fields,
//! so `try`/`catch` always sees one uniform shape regardless of whether the
//! error originated from a builtin, the evaluator, or a user `throw`.

pub use hemlock_core::error::{ErrorKind, RuntimeError};

use crate::heap::object_obj::ObjectObj;
use crate::value::Value;

pub type Thrown = hemlock_core::error::Thrown<Value>;

pub fn thrown(value: Value) -> Thrown {
    hemlock_core::error::Thrown(value)
}

impl From<RuntimeError> for Thrown {
    fn from(err: RuntimeError) -> Self {
        let obj = ObjectObj::from_entries(
            Some("Error".to_string()),
            vec![
                ("kind".to_string(), Value::string(err.kind.to_string())),
                ("message".to_string(), Value::string(err.message.clone())),
            ],
        );
        hemlock_core::error::Thrown(Value::new_object(obj))
    }
}

/// Convenience for call sites that have a `RuntimeError` and need a
/// `Result<T, Thrown>` directly.
pub fn raise<T>(err: RuntimeError) -> Result<T, Thrown> {
    Err(err.into())
}
