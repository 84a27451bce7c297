//! Buffer method table (spec.md §4.5 "Buffer").

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::BufferObj;
use crate::value::Value;

fn arg_i64(args: &[Value], i: usize, what: &str) -> Result<i64, Thrown> {
    args.get(i)
        .and_then(Value::as_i64)
        .ok_or_else(|| RuntimeError::type_error(format!("{what} expects an integer argument")).into())
}

pub fn call(recv: &Handle<BufferObj>, method: &str, args: &[Value]) -> Result<Value, Thrown> {
    let b = recv.get().map_err(RuntimeError::from)?;
    match method {
        "length" => Ok(Value::I64(b.length() as i64)),
        "get" => Ok(Value::U8(b.get(arg_i64(args, 0, "get")?).map_err(Thrown::from)?)),
        "set" => {
            let i = arg_i64(args, 0, "set")?;
            let v = arg_i64(args, 1, "set")?;
            b.set(i, v).map_err(Thrown::from)?;
            Ok(Value::Null)
        }
        "slice" => {
            let start = arg_i64(args, 0, "slice")?;
            let end = args.get(1).and_then(Value::as_i64).unwrap_or(b.length() as i64);
            Ok(Value::new_buffer(b.slice(start, end)))
        }
        other => Err(RuntimeError::type_error(format!("buffer has no method '{other}'")).into()),
    }
}
