//! `spawn`: launches a function body on its own OS thread and hands back a
//! `Task` handle (spec.md §4.7 "Tasks").
//!
//! Grounded on the teacher's strand lifecycle bookkeeping in
//! `scheduler.rs` (`ACTIVE_STRANDS` counter incremented on spawn,
//! decremented on completion) — here realized through `Runtime::
//! on_task_spawned`/`on_task_finished` instead of a static, per spec.md §9.
//! A real OS thread per task rather than May's green threads: spec.md never
//! asks for cooperative scheduling, and `hemlock-core` carries no
//! coroutine runtime, so `std::thread::spawn` is the idiomatic substitute.

use hemlock_core::error::RuntimeError;
use hemlock_core::handle::Handle;

use crate::error::Thrown;
use crate::heap::{FunctionObj, TaskObj};
use crate::runtime::Runtime;
use crate::value::Value;

/// Spawns `func` with `args` on a new thread. Only async functions
/// (`async fn`) may be spawned (spec.md §4.7, "spawning a non-async
/// function is a concurrency error").
pub fn spawn(func: &Value, args: Vec<Value>, runtime: &Runtime) -> Result<Value, Thrown> {
    let func_handle = match func {
        Value::Function(h) => h.clone(),
        other => return Err(RuntimeError::type_error(format!("cannot spawn a {:?}", other.tag())).into()),
    };
    if !func_handle.get().map_err(RuntimeError::from)?.is_async {
        return Err(RuntimeError::concurrency("spawn requires an async function").into());
    }

    let task = Handle::new(TaskObj::new());
    let task_for_thread = task.clone();
    let runtime_for_thread = runtime.clone();
    runtime.on_task_spawned();
    let fn_name = func_handle.get().ok().and_then(|f| f.name.clone()).unwrap_or_else(|| "<anonymous>".to_string());
    tracing::debug!("spawning task for function '{fn_name}'");

    std::thread::spawn(move || {
        let result = crate::evaluator::call_spawned(func_handle, args, runtime_for_thread.clone());
        match task_for_thread.get() {
            Ok(t) => match result {
                Ok(v) => t.complete(v),
                Err(thrown) => {
                    let err = thrown.into_inner();
                    tracing::debug!("task failed: {}", err.to_display_string());
                    t.fail(err);
                }
            },
            Err(_) => {
                // The task handle was force-freed while the thread was
                // still running; nothing left to report the result to.
            }
        }
        runtime_for_thread.on_task_finished();
    });

    Ok(Value::Task(task))
}

/// `task.join()` — blocks the caller until the task reaches a terminal
/// state, re-raising its failure if it failed (spec.md §4.7).
pub fn join(task: &Handle<TaskObj>) -> Result<Value, Thrown> {
    task.get().map_err(RuntimeError::from)?.join()
}

/// `task.detach()` — releases the caller's interest in the result; a
/// subsequent `join` fails (spec.md §4.7).
pub fn detach(task: &Handle<TaskObj>) -> Result<(), Thrown> {
    task.get().map_err(RuntimeError::from)?.detach();
    Ok(())
}
