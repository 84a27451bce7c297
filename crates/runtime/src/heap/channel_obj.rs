//! `ChannelObj`: a bounded, blocking queue of `Value` (spec.md §4.7).
//!
//! Built from a `Mutex` + two `Condvar`s exactly as spec.md §4.7 names
//! them (`not_empty_cv`, `not_full_cv`) rather than `may::sync::mpmc` —
//! the spec's capacity-0-is-rendezvous and explicit happens-before
//! ordering guarantees (spec.md §5) are easiest to state and test against
//! a ring buffer we control directly.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use crate::error::Thrown;
use crate::error::RuntimeError;
use crate::value::Value;

struct Inner {
    buffer: VecDeque<Value>,
    capacity: usize,
    closed: bool,
}

pub struct ChannelObj {
    state: Mutex<Inner>,
    not_empty: Condvar,
    not_full: Condvar,
}

pub enum TrySendResult {
    Sent,
    Full,
    Closed,
}

pub enum TryRecvResult {
    Received(Value),
    Empty,
    ClosedAndEmpty,
}

impl ChannelObj {
    /// `capacity == 0` is a rendezvous channel: `send` blocks until a
    /// `recv` is waiting to take the value (spec.md §4.7).
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(Inner {
                buffer: VecDeque::new(),
                capacity,
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).capacity
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).buffer.len()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).closed
    }

    fn room_available(inner: &Inner) -> bool {
        if inner.capacity == 0 {
            // Rendezvous: room exists only the instant a receiver is
            // waiting to pair with a send; modeled here as "buffer empty",
            // with recv draining it immediately under the same lock.
            inner.buffer.is_empty()
        } else {
            inner.buffer.len() < inner.capacity
        }
    }

    /// Blocks until room is available or the channel closes (spec.md
    /// §4.7). Fails immediately if already closed.
    pub fn send(&self, value: Value) -> Result<(), Thrown> {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if guard.closed {
            return Err(RuntimeError::concurrency("cannot send to closed channel").into());
        }
        while !Self::room_available(&guard) && !guard.closed {
            guard = self.not_full.wait(guard).unwrap_or_else(|p| p.into_inner());
        }
        if guard.closed {
            return Err(RuntimeError::concurrency("cannot send to closed channel").into());
        }
        guard.buffer.push_back(value);
        self.not_empty.notify_one();
        if guard.capacity == 0 {
            // True rendezvous: don't return from send until a receiver has
            // actually taken the value off the single slot (spec.md §4.7,
            // "sender blocks until a receiver picks up").
            while !guard.buffer.is_empty() && !guard.closed {
                guard = self.not_full.wait(guard).unwrap_or_else(|p| p.into_inner());
            }
        }
        Ok(())
    }

    /// Blocks until a value is available or the channel closes; returns
    /// `Null` on close-while-empty (spec.md §4.7).
    pub fn recv(&self) -> Value {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        while guard.buffer.is_empty() && !guard.closed {
            guard = self.not_empty.wait(guard).unwrap_or_else(|p| p.into_inner());
        }
        match guard.buffer.pop_front() {
            Some(v) => {
                self.not_full.notify_one();
                v
            }
            None => Value::Null,
        }
    }

    /// `recv` with an optional timeout; returns `Null` on expiry as well as
    /// on close-while-empty (spec.md §5 "Cancellation and timeouts").
    pub fn recv_timeout(&self, timeout: Duration) -> Value {
        let deadline = Instant::now() + timeout;
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        while guard.buffer.is_empty() && !guard.closed {
            let now = Instant::now();
            if now >= deadline {
                return Value::Null;
            }
            let (g, timeout_result) = self
                .not_empty
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(|p| p.into_inner());
            guard = g;
            if timeout_result.timed_out() && guard.buffer.is_empty() {
                return Value::Null;
            }
        }
        match guard.buffer.pop_front() {
            Some(v) => {
                self.not_full.notify_one();
                v
            }
            None => Value::Null,
        }
    }

    pub fn try_send(&self, value: Value) -> TrySendResult {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        if guard.closed {
            return TrySendResult::Closed;
        }
        if !Self::room_available(&guard) {
            return TrySendResult::Full;
        }
        guard.buffer.push_back(value);
        self.not_empty.notify_one();
        TrySendResult::Sent
    }

    pub fn try_recv(&self) -> TryRecvResult {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        match guard.buffer.pop_front() {
            Some(v) => {
                self.not_full.notify_one();
                TryRecvResult::Received(v)
            }
            None if guard.closed => TryRecvResult::ClosedAndEmpty,
            None => TryRecvResult::Empty,
        }
    }

    /// Idempotent; wakes every blocked sender/receiver (spec.md §4.7).
    pub fn close(&self) {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        guard.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

impl std::fmt::Debug for ChannelObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f.debug_struct("ChannelObj")
            .field("len", &guard.buffer.len())
            .field("capacity", &guard.capacity)
            .field("closed", &guard.closed)
            .finish()
    }
}
