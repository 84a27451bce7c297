//! Array method table (spec.md §4.5 "Array").

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::ArrayObj;
use crate::runtime::Runtime;
use crate::value::Value;

fn arg_i64(args: &[Value], i: usize, what: &str) -> Result<i64, Thrown> {
    args.get(i)
        .and_then(Value::as_i64)
        .ok_or_else(|| RuntimeError::type_error(format!("{what} expects an integer argument")).into())
}

pub fn call(recv: &Handle<ArrayObj>, method: &str, args: &[Value], runtime: &Runtime) -> Result<Value, Thrown> {
    let a = recv.get().map_err(RuntimeError::from)?;
    match method {
        "length" => Ok(Value::I64(a.length() as i64)),
        "push" => {
            let v = args.first().cloned().unwrap_or(Value::Null);
            a.push(v).map_err(Thrown::from)?;
            Ok(Value::I64(a.length() as i64))
        }
        "pop" => Ok(a.pop().unwrap_or(Value::Null)),
        "shift" => Ok(a.shift().unwrap_or(Value::Null)),
        "unshift" => {
            let v = args.first().cloned().unwrap_or(Value::Null);
            a.unshift(v).map_err(Thrown::from)?;
            Ok(Value::I64(a.length() as i64))
        }
        "insert" => {
            let i = arg_i64(args, 0, "insert")?;
            let v = args.get(1).cloned().unwrap_or(Value::Null);
            a.insert(i, v).map_err(Thrown::from)?;
            Ok(Value::Null)
        }
        "remove" => {
            let i = arg_i64(args, 0, "remove")?;
            a.remove(i).map_err(Into::into)
        }
        "get" => {
            let i = arg_i64(args, 0, "get")?;
            a.get(i).map_err(Into::into)
        }
        "set" => {
            let i = arg_i64(args, 0, "set")?;
            let v = args.get(1).cloned().unwrap_or(Value::Null);
            a.set(i, v).map_err(Thrown::from)?;
            Ok(Value::Null)
        }
        "first" => Ok(a.first().unwrap_or(Value::Null)),
        "last" => Ok(a.last().unwrap_or(Value::Null)),
        "clear" => {
            a.clear();
            Ok(Value::Null)
        }
        "find" => {
            let needle = args.first().cloned().unwrap_or(Value::Null);
            Ok(match a.find(&needle) {
                Some(i) => Value::I64(i),
                None => Value::Null,
            })
        }
        "contains" => {
            let needle = args.first().cloned().unwrap_or(Value::Null);
            Ok(Value::Bool(a.contains(&needle)))
        }
        "slice" => {
            let start = arg_i64(args, 0, "slice")?;
            let end = args.get(1).and_then(Value::as_i64).unwrap_or(a.length() as i64);
            Ok(Value::new_array(a.slice(start, end)))
        }
        "join" => {
            let sep = match args.first() {
                Some(Value::String(h)) => h.get().map_err(RuntimeError::from)?.as_str_lossy(),
                _ => ",".to_string(),
            };
            Ok(Value::string(a.join(&sep)))
        }
        "concat" => match args.first() {
            Some(Value::Array(other)) => {
                let other_arr = other.get().map_err(RuntimeError::from)?;
                Ok(Value::new_array(a.concat(other_arr)))
            }
            _ => Err(RuntimeError::type_error("concat expects an array argument").into()),
        },
        "reverse" => {
            a.reverse();
            Ok(Value::Array(recv.clone()))
        }
        "map" => {
            let f = args.first().cloned().ok_or_else(|| RuntimeError::arity("map expects a function argument"))?;
            let mut out = Vec::with_capacity(a.length());
            for item in a.to_vec() {
                out.push(crate::evaluator::dispatch_call(&f, vec![item], vec![], runtime)?);
            }
            Ok(Value::new_array(out))
        }
        "filter" => {
            let f = args.first().cloned().ok_or_else(|| RuntimeError::arity("filter expects a function argument"))?;
            let mut out = Vec::new();
            for item in a.to_vec() {
                if crate::evaluator::dispatch_call(&f, vec![item.clone()], vec![], runtime)?.truthiness() {
                    out.push(item);
                }
            }
            Ok(Value::new_array(out))
        }
        "reduce" => {
            let f = args.first().cloned().ok_or_else(|| RuntimeError::arity("reduce expects a function argument"))?;
            let mut items = a.to_vec().into_iter();
            let mut acc = match args.get(1) {
                Some(init) => init.clone(),
                None => items.next().ok_or_else(|| RuntimeError::type_error("reduce of empty array with no initial value"))?,
            };
            for item in items {
                acc = crate::evaluator::dispatch_call(&f, vec![acc, item], vec![], runtime)?;
            }
            Ok(acc)
        }
        other => Err(RuntimeError::type_error(format!("array has no method '{other}'")).into()),
    }
}
