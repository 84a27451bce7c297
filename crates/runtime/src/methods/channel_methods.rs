//! Channel method table (spec.md §4.7: `send`, `recv`, `close`).
//!
//! Unlike `spawn`/`channel`/`join`/`detach`/`free`, these are ordinary
//! receiver-dispatched methods (spec.md §8 example 4 calls them as
//! `ch.send(...)`), so they live here rather than among the evaluator
//! intrinsics — `call_method` already carries a `&Runtime` for the close
//! path's open-channel bookkeeping.

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::ChannelObj;
use crate::runtime::Runtime;
use crate::value::Value;

pub fn call(recv: &Handle<ChannelObj>, method: &str, args: &[Value], runtime: &Runtime) -> Result<Value, Thrown> {
    match method {
        "send" => {
            let v = args.first().cloned().unwrap_or(Value::Null);
            crate::channel::send(recv, v)?;
            Ok(Value::Null)
        }
        "recv" => match args.first().and_then(Value::as_f64) {
            Some(timeout_secs) => {
                let c = recv.get().map_err(RuntimeError::from)?;
                Ok(c.recv_timeout(std::time::Duration::from_secs_f64(timeout_secs.max(0.0))))
            }
            None => crate::channel::recv(recv),
        },
        "close" => {
            crate::channel::close(recv, runtime)?;
            Ok(Value::Null)
        }
        "len" => Ok(Value::I64(recv.get().map_err(RuntimeError::from)?.len() as i64)),
        "capacity" => Ok(Value::I64(recv.get().map_err(RuntimeError::from)?.capacity() as i64)),
        "is_closed" => Ok(Value::Bool(recv.get().map_err(RuntimeError::from)?.is_closed())),
        other => Err(RuntimeError::type_error(format!("channel has no method '{other}'")).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_then_recv_roundtrips_through_method_dispatch() {
        let runtime = Runtime::default();
        let h = Handle::new(ChannelObj::new(1));
        call(&h, "send", &[Value::I64(5)], &runtime).unwrap();
        assert_eq!(call(&h, "recv", &[], &runtime).unwrap(), Value::I64(5));
    }

    #[test]
    fn recv_with_timeout_on_empty_channel_returns_null() {
        let runtime = Runtime::default();
        let h = Handle::new(ChannelObj::new(1));
        let result = call(&h, "recv", &[Value::F64(0.01)], &runtime).unwrap();
        assert_eq!(result, Value::Null);
    }

    #[test]
    fn close_is_visible_through_is_closed() {
        let runtime = Runtime::default();
        let h = Handle::new(ChannelObj::new(1));
        runtime.on_channel_opened();
        call(&h, "close", &[], &runtime).unwrap();
        assert_eq!(call(&h, "is_closed", &[], &runtime).unwrap(), Value::Bool(true));
    }
}
