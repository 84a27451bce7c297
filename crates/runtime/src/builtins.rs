//! The standard-library builtin registry (spec.md §6, "Built-in
//! registry").
//!
//! Registration form per spec.md: `(name, arity, variadic_flag,
//! implementation_pointer)`. `spawn`/`channel`/`join`/`detach`/`free` are
//! NOT registered here — they need a `&Runtime` the `BuiltinFnValue`
//! implementation signature (`Fn(&[Value]) -> Result<Value, Thrown>`) has
//! no room for, so the evaluator recognizes those five names as
//! intrinsics before consulting this table (see `evaluator::eval_call`).
//! Everything that only needs its arguments — printing, type queries,
//! numeric conversions — lives here instead, grounded on the teacher's
//! `io.rs`/`string_ops.rs` builtin surface.

use std::sync::Arc;

use hemlock_core::error::RuntimeError;

use crate::error::Thrown;
use crate::value::{BuiltinFnValue, Value};

pub struct BuiltinRegistry {
    entries: Vec<(Arc<str>, Value)>,
}

fn builtin(name: &str, arity: usize, variadic: bool, f: impl Fn(&[Value]) -> Result<Value, Thrown> + Send + Sync + 'static) -> (Arc<str>, Value) {
    let name: Arc<str> = Arc::from(name);
    let value = Value::BuiltinFn(BuiltinFnValue {
        name: name.clone(),
        arity,
        variadic,
        implementation: Arc::new(f),
        captured_env: None,
    });
    (name, value)
}

impl BuiltinRegistry {
    pub fn with_standard_library() -> Self {
        let entries = vec![
            builtin("print", 1, false, |args| {
                println!("{}", args[0].to_display_string());
                Ok(Value::Null)
            }),
            builtin("type_of", 1, false, |args| Ok(Value::Type(args[0].tag()))),
            builtin("to_string", 1, false, |args| Ok(Value::string(args[0].to_display_string()))),
            builtin("sleep", 1, false, |args| {
                let millis = args[0]
                    .as_i64()
                    .ok_or_else(|| RuntimeError::type_error("sleep expects an integer number of milliseconds"))?;
                if millis < 0 {
                    return Err(RuntimeError::range("sleep duration must not be negative").into());
                }
                std::thread::sleep(std::time::Duration::from_millis(millis as u64));
                Ok(Value::Null)
            }),
        ];
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n.as_ref() == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_ref())
    }

    /// Defines every registered builtin as a binding in `env`, so ordinary
    /// identifier lookup finds them (spec.md §4.3's `lookup` walks the
    /// environment chain; this seeds the root of that chain once at
    /// program start).
    pub fn install_into(&self, env: &crate::environment::Environment) {
        for (name, value) in &self.entries {
            let _ = env.define(name, value.clone(), true);
        }
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::with_standard_library()
    }
}
