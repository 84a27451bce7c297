//! Object method table (spec.md §4.5 "Object").

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::ObjectObj;
use crate::value::Value;

fn arg_str(args: &[Value], i: usize, what: &str) -> Result<String, Thrown> {
    match args.get(i) {
        Some(Value::String(h)) => Ok(h.get().map_err(RuntimeError::from)?.as_str_lossy()),
        _ => Err(RuntimeError::type_error(format!("{what} expects a string argument")).into()),
    }
}

pub fn call(recv: &Handle<ObjectObj>, method: &str, args: &[Value]) -> Result<Value, Thrown> {
    let o = recv.get().map_err(RuntimeError::from)?;
    match method {
        "get" => Ok(o.get(&arg_str(args, 0, "get")?).unwrap_or(Value::Null)),
        "set" => {
            let name = arg_str(args, 0, "set")?;
            let v = args.get(1).cloned().unwrap_or(Value::Null);
            o.set(name, v);
            Ok(Value::Null)
        }
        "has" => Ok(Value::Bool(o.has(&arg_str(args, 0, "has")?))),
        #[cfg(feature = "report-json")]
        "serialize" => crate::json::serialize(&Value::Object(recv.clone())).map(Value::string).map_err(Into::into),
        other => Err(RuntimeError::type_error(format!("object has no method '{other}'")).into()),
    }
}
