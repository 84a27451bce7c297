//! File method table (spec.md §4.5 "File").

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::FileObj;
use crate::value::Value;

fn arg_i64(args: &[Value], i: usize, what: &str) -> Result<i64, Thrown> {
    args.get(i)
        .and_then(Value::as_i64)
        .ok_or_else(|| RuntimeError::type_error(format!("{what} expects an integer argument")).into())
}

pub fn call(recv: &Handle<FileObj>, method: &str, args: &[Value]) -> Result<Value, Thrown> {
    let f = recv.get().map_err(RuntimeError::from)?;
    match method {
        "read" => Ok(Value::string(f.read().map_err(Thrown::from)?)),
        "read_bytes" => {
            let n = arg_i64(args, 0, "read_bytes")?.max(0) as usize;
            Ok(Value::new_buffer(crate::heap::BufferObj::from_bytes(f.read_bytes(n).map_err(Thrown::from)?)))
        }
        "write" => {
            let s = match args.first() {
                Some(Value::String(h)) => h.get().map_err(RuntimeError::from)?.as_str_lossy(),
                _ => return Err(RuntimeError::type_error("write expects a string argument").into()),
            };
            f.write(&s).map_err(Thrown::from)?;
            Ok(Value::Null)
        }
        "close" => {
            f.close().map_err(Thrown::from)?;
            Ok(Value::Null)
        }
        "seek" => {
            let pos = arg_i64(args, 0, "seek")?;
            Ok(Value::I64(f.seek(pos).map_err(Thrown::from)? as i64))
        }
        other => Err(RuntimeError::type_error(format!("file has no method '{other}'")).into()),
    }
}
