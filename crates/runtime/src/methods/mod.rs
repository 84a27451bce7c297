//! Method and property dispatch (spec.md §4.5 "Method dispatch and
//! collection methods", §4.4 "Property/index access").
//!
//! The evaluator resolves `x.method(args)` by checking the receiver's
//! builtin method table first, then — only for `Object` receivers —
//! falling back to a same-named field holding a callable (spec.md §4.5).
//! Bare property access (`x.name`, no call) instead reads object fields
//! directly or one of a small set of pseudo-properties (`length` on
//! string/array/buffer).

pub mod array_methods;
pub mod buffer_methods;
pub mod channel_methods;
pub mod file_methods;
pub mod object_methods;
pub mod string_methods;

use hemlock_core::error::RuntimeError;

use crate::error::Thrown;
use crate::runtime::Runtime;
use crate::value::Value;

pub fn call_method(receiver: &Value, method: &str, args: &[Value], runtime: &Runtime) -> Result<Value, Thrown> {
    match receiver {
        Value::String(h) => string_methods::call(h, method, args),
        Value::Array(h) => array_methods::call(h, method, args, runtime),
        Value::Buffer(h) => buffer_methods::call(h, method, args),
        Value::Channel(h) => channel_methods::call(h, method, args, runtime),
        Value::File(h) => file_methods::call(h, method, args),
        Value::Object(h) => match object_methods::call(h, method, args) {
            Ok(v) => Ok(v),
            Err(_) => {
                let obj = h.get().map_err(RuntimeError::from)?;
                match obj.get(method) {
                    Some(callable @ (Value::Function(_) | Value::BuiltinFn(_))) => {
                        crate::evaluator::dispatch_call(&callable, args.to_vec(), Vec::new(), runtime)
                    }
                    _ => Err(RuntimeError::type_error(format!("object has no method '{method}'")).into()),
                }
            }
        },
        _ => Err(RuntimeError::type_error(format!(
            "{:?} has no method '{method}'",
            receiver.tag()
        ))
        .into()),
    }
}

/// Bare property access (`x.name`), distinct from a method call.
pub fn property_get(receiver: &Value, name: &str) -> Result<Value, Thrown> {
    match receiver {
        Value::String(h) if name == "length" => {
            Ok(Value::I64(h.get().map_err(RuntimeError::from)?.byte_length() as i64))
        }
        Value::String(h) if name == "char_length" => {
            Ok(Value::I64(h.get().map_err(RuntimeError::from)?.char_length() as i64))
        }
        Value::Array(h) if name == "length" => Ok(Value::I64(h.get().map_err(RuntimeError::from)?.length() as i64)),
        Value::Buffer(h) if name == "length" => Ok(Value::I64(h.get().map_err(RuntimeError::from)?.length() as i64)),
        Value::Object(h) => h
            .get()
            .map_err(RuntimeError::from)?
            .get(name)
            .ok_or_else(|| RuntimeError::undefined(format!("object has no field '{name}'")).into()),
        _ => Err(RuntimeError::type_error(format!("no property '{name}' on {:?}", receiver.tag())).into()),
    }
}

pub fn property_set(receiver: &Value, name: &str, value: Value) -> Result<(), Thrown> {
    match receiver {
        Value::Object(h) => {
            h.get().map_err(RuntimeError::from)?.set(name.to_string(), value);
            Ok(())
        }
        _ => Err(RuntimeError::type_error(format!("cannot set property '{name}' on {:?}", receiver.tag())).into()),
    }
}

/// Indexing is by byte for strings (spec.md §3), by byte for buffers, by
/// element for arrays.
pub fn index_get(receiver: &Value, index: &Value) -> Result<Value, Thrown> {
    let i = index
        .as_i64()
        .ok_or_else(|| RuntimeError::type_error("index must be an integer"))?;
    match receiver {
        Value::String(h) => Ok(Value::U8(h.get().map_err(RuntimeError::from)?.byte_at(i).map_err(Thrown::from)?)),
        Value::Buffer(h) => Ok(Value::U8(h.get().map_err(RuntimeError::from)?.get(i).map_err(Thrown::from)?)),
        Value::Array(h) => h.get().map_err(RuntimeError::from)?.get(i).map_err(Into::into),
        _ => Err(RuntimeError::type_error(format!("{:?} is not indexable", receiver.tag())).into()),
    }
}

pub fn index_set(receiver: &Value, index: &Value, value: Value) -> Result<(), Thrown> {
    let i = index
        .as_i64()
        .ok_or_else(|| RuntimeError::type_error("index must be an integer"))?;
    match receiver {
        Value::String(h) => {
            let byte = value.as_i64().ok_or_else(|| RuntimeError::type_error("string index assignment expects an integer"))?;
            h.get().map_err(RuntimeError::from)?.set_byte(i, byte).map_err(Into::into)
        }
        Value::Buffer(h) => {
            let byte = value.as_i64().ok_or_else(|| RuntimeError::type_error("buffer index assignment expects an integer"))?;
            h.get().map_err(RuntimeError::from)?.set(i, byte).map_err(Into::into)
        }
        Value::Array(h) => h.get().map_err(RuntimeError::from)?.set(i, value).map_err(Into::into),
        _ => Err(RuntimeError::type_error(format!("{:?} does not support index assignment", receiver.tag())).into()),
    }
}

/// Elements a `for...in` loop walks (spec.md §3 "for (C-style and
/// for-in)"). Objects iterate as `[key, value]` pairs.
pub fn iterate(value: &Value) -> Result<Vec<Value>, Thrown> {
    match value {
        Value::Array(h) => Ok(h.get().map_err(RuntimeError::from)?.to_vec()),
        Value::String(h) => Ok(h
            .get()
            .map_err(RuntimeError::from)?
            .as_str_lossy()
            .chars()
            .map(|c| Value::Rune(c as u32))
            .collect()),
        Value::Object(h) => Ok(h
            .get()
            .map_err(RuntimeError::from)?
            .entries_snapshot()
            .into_iter()
            .map(|(k, v)| Value::new_array(vec![Value::string(k), v]))
            .collect()),
        other => Err(RuntimeError::type_error(format!("{:?} is not iterable", other.tag())).into()),
    }
}
