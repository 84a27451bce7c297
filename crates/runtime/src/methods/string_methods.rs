//! String method table (spec.md §4.5 "String").

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::StringObj;
use crate::value::Value;

fn arg_i64(args: &[Value], i: usize, what: &str) -> Result<i64, Thrown> {
    args.get(i)
        .and_then(Value::as_i64)
        .ok_or_else(|| RuntimeError::type_error(format!("{what} expects an integer argument")).into())
}

fn arg_str(args: &[Value], i: usize, what: &str) -> Result<String, Thrown> {
    match args.get(i) {
        Some(Value::String(h)) => Ok(h.get().map_err(RuntimeError::from)?.as_str_lossy()),
        _ => Err(RuntimeError::type_error(format!("{what} expects a string argument")).into()),
    }
}

pub fn call(recv: &Handle<StringObj>, method: &str, args: &[Value]) -> Result<Value, Thrown> {
    let s = recv.get().map_err(RuntimeError::from)?;
    match method {
        "length" => Ok(Value::I64(s.byte_length() as i64)),
        "char_length" => Ok(Value::I64(s.char_length() as i64)),
        "char_at" => {
            let i = arg_i64(args, 0, "char_at")?;
            Ok(Value::Rune(s.char_at(i).map_err(Thrown::from)? as u32))
        }
        "byte_at" => {
            let i = arg_i64(args, 0, "byte_at")?;
            Ok(Value::U8(s.byte_at(i).map_err(Thrown::from)?))
        }
        "slice" => {
            let start = arg_i64(args, 0, "slice")?;
            let end = args.get(1).and_then(Value::as_i64);
            Ok(Value::new_buffer(crate::heap::BufferObj::from_bytes(s.slice(start, end))))
        }
        "substr" => {
            let start = arg_i64(args, 0, "substr")?;
            let count = args.get(1).and_then(Value::as_i64);
            Ok(Value::string(s.substr(start, count)))
        }
        "split" => {
            let sep = arg_str(args, 0, "split")?;
            let parts = s.split(&sep).into_iter().map(Value::string).collect();
            Ok(Value::new_array(parts))
        }
        "find" => {
            let needle = arg_str(args, 0, "find")?;
            Ok(match s.find(&needle) {
                Some(i) => Value::I64(i),
                None => Value::Null,
            })
        }
        "contains" => Ok(Value::Bool(s.contains(&arg_str(args, 0, "contains")?))),
        "starts_with" => Ok(Value::Bool(s.starts_with(&arg_str(args, 0, "starts_with")?))),
        "ends_with" => Ok(Value::Bool(s.ends_with(&arg_str(args, 0, "ends_with")?))),
        "trim" => Ok(Value::string(s.trim())),
        "to_upper" => Ok(Value::string(s.to_upper())),
        "to_lower" => Ok(Value::string(s.to_lower())),
        "replace" => {
            let old = arg_str(args, 0, "replace")?;
            let new = arg_str(args, 1, "replace")?;
            Ok(Value::string(s.replace(&old, &new)))
        }
        "repeat" => Ok(Value::string(s.repeat(arg_i64(args, 0, "repeat")?))),
        "to_bytes" => Ok(Value::new_buffer(crate::heap::BufferObj::from_bytes(s.as_bytes()))),
        #[cfg(feature = "report-json")]
        "serialize" => crate::json::serialize(&Value::String(recv.clone())).map(Value::string).map_err(Into::into),
        #[cfg(feature = "report-json")]
        "deserialize" => crate::json::deserialize(&s.as_str_lossy()).map_err(Into::into),
        other => Err(RuntimeError::type_error(format!("string has no method '{other}'")).into()),
    }
}
