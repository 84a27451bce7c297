//! `channel(capacity)`: constructs a `ChannelObj` and tracks it in the
//! runtime's open-channel counter (spec.md §4.7 "Channels").
//!
//! Grounded on the teacher's `make_channel`/`close_channel` builtins in
//! `channel.rs`, which register/deregister a channel in a process-wide
//! table the same way; here the bookkeeping lives on `Runtime` instead of
//! a static (spec.md §9).

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::ChannelObj;
use crate::runtime::Runtime;
use crate::value::Value;

/// `channel()` uses `RuntimeConfig::channel_default_capacity` (0 ==
/// rendezvous); `channel(n)` opens one with an explicit buffer size.
pub fn make(capacity: Option<i64>, runtime: &Runtime) -> Result<Value, Thrown> {
    let capacity = match capacity {
        Some(n) if n < 0 => return Err(RuntimeError::range("channel capacity must not be negative").into()),
        Some(n) => n as usize,
        None => runtime.config().channel_default_capacity,
    };
    let handle = Handle::new(ChannelObj::new(capacity));
    runtime.on_channel_opened();
    Ok(Value::Channel(handle))
}

pub fn send(chan: &Handle<ChannelObj>, value: Value) -> Result<(), Thrown> {
    chan.get().map_err(RuntimeError::from)?.send(value)
}

pub fn recv(chan: &Handle<ChannelObj>) -> Result<Value, Thrown> {
    Ok(chan.get().map_err(RuntimeError::from)?.recv())
}

/// Closes the channel and releases it from the runtime's open-channel
/// count. Idempotent — closing twice just decrements once, matching
/// `ChannelObj::close`'s own idempotence.
pub fn close(chan: &Handle<ChannelObj>, runtime: &Runtime) -> Result<(), Thrown> {
    let c = chan.get().map_err(RuntimeError::from)?;
    let was_open = !c.is_closed();
    c.close();
    if was_open {
        runtime.on_channel_closed();
        tracing::debug!("closed channel at {:#x}", chan.address());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_tracks_open_channel_count() {
        let runtime = Runtime::default();
        let v = make(Some(4), &runtime).unwrap();
        assert_eq!(runtime.stats().open_channel_count, 1);
        let Value::Channel(h) = v else { panic!("expected a channel") };
        close(&h, &runtime).unwrap();
        assert_eq!(runtime.stats().open_channel_count, 0);
    }

    #[test]
    fn negative_capacity_is_a_range_error() {
        let runtime = Runtime::default();
        assert!(make(Some(-1), &runtime).is_err());
    }

    #[test]
    fn send_then_recv_roundtrips_a_value() {
        let runtime = Runtime::default();
        let v = make(Some(1), &runtime).unwrap();
        let Value::Channel(h) = v else { panic!("expected a channel") };
        send(&h, Value::I64(7)).unwrap();
        assert_eq!(recv(&h).unwrap(), Value::I64(7));
    }
}
