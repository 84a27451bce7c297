//! `TaskObj`: the state machine backing a spawned task (spec.md §4.6).
//!
//! This module only owns the state machine (`Running → Completed | Failed`,
//! sticky, plus the joined/detached flags); `crate::task` owns the actual
//! `std::thread::spawn` call and wires a function+environment to this
//! object's `complete`/`fail`.

use std::sync::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use hemlock_core::error::RuntimeError;

use crate::error::Thrown;
use crate::value::Value;

#[derive(Debug, Clone)]
enum State {
    Running,
    Completed(Value),
    Failed(Value),
}

pub struct TaskObj {
    state: Mutex<State>,
    cv: Condvar,
    joined: AtomicBool,
    detached: AtomicBool,
}

impl TaskObj {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::Running),
            cv: Condvar::new(),
            joined: AtomicBool::new(false),
            detached: AtomicBool::new(false),
        }
    }

    /// Called from the task's own thread once the function body returns
    /// normally.
    pub fn complete(&self, value: Value) {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        *guard = State::Completed(value);
        self.cv.notify_all();
    }

    /// Called from the task's own thread when the function body throws an
    /// uncaught error.
    pub fn fail(&self, error: Value) {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        *guard = State::Failed(error);
        self.cv.notify_all();
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(
            *self.state.lock().unwrap_or_else(|p| p.into_inner()),
            State::Running
        )
    }

    /// Blocks until terminal, returns the completion value or re-raises the
    /// failure, and marks the task consumed. A second `join` fails (spec.md
    /// §4.6, §8 property 7).
    pub fn join(&self) -> Result<Value, Thrown> {
        if self.detached.load(Ordering::Acquire) {
            return Err(RuntimeError::concurrency("cannot join a detached task").into());
        }
        if self.joined.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::concurrency("task handle already joined").into());
        }
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        while matches!(*guard, State::Running) {
            guard = self.cv.wait(guard).unwrap_or_else(|p| p.into_inner());
        }
        match &*guard {
            State::Completed(v) => Ok(v.clone()),
            State::Failed(e) => Err(crate::error::thrown(e.clone())),
            State::Running => unreachable!("loop only exits on a terminal state"),
        }
    }

    /// Marks the task ownerless; subsequent `join` fails (spec.md §4.6).
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::Acquire)
    }
}

impl Default for TaskObj {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TaskObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskObj")
            .field("terminal", &self.is_terminal())
            .field("joined", &self.is_joined())
            .field("detached", &self.is_detached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_blocks_until_complete() {
        let task = std::sync::Arc::new(TaskObj::new());
        let t2 = task.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            t2.complete(Value::I64(42));
        });
        assert_eq!(task.join().unwrap(), Value::I64(42));
        handle.join().unwrap();
    }

    #[test]
    fn second_join_fails() {
        let task = TaskObj::new();
        task.complete(Value::Null);
        task.join().unwrap();
        assert!(task.join().is_err());
    }

    #[test]
    fn join_on_detached_task_fails() {
        let task = TaskObj::new();
        task.detach();
        task.complete(Value::Null);
        assert!(task.join().is_err());
    }

    #[test]
    fn failure_reraises_on_join() {
        let task = TaskObj::new();
        task.fail(Value::string("boom"));
        assert!(task.join().is_err());
    }
}
