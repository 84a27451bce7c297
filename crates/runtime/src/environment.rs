//! The environment: a linked chain of scopes (spec.md §3 "Environment",
//! §4.3).
//!
//! Scopes are shared-mutable by design — closures capture a scope by handle
//! and writes through one closure are visible to every other closure
//! sharing the chain (spec.md §9, "Closures and captured environments").
//! That rules out `hemlock_core::Handle<T>`, which only ever exposes `&T`:
//! `Environment` instead uses a plain `Arc<Mutex<ScopeData>>` chain, the
//! idiomatic Rust tool for ordinary shared-mutable state, as opposed to
//! manually-freed heap values.

use std::sync::{Arc, Mutex};

use hemlock_core::error::RuntimeError;

use crate::value::Value;

struct Binding {
    name: String,
    value: Value,
    is_const: bool,
}

struct ScopeData {
    bindings: Vec<Binding>,
    parent: Option<Environment>,
}

/// A handle to one scope frame. Cloning an `Environment` shares the same
/// underlying scope (spec.md's "captured by handle"), it does not copy
/// bindings.
#[derive(Clone)]
pub struct Environment {
    inner: Arc<Mutex<ScopeData>>,
}

impl Environment {
    pub fn root() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScopeData {
                bindings: Vec::new(),
                parent: None,
            })),
        }
    }

    /// A fresh child scope of `self` — used for block entry, function call
    /// frames, catch clauses, and spawned tasks (spec.md §4.3 "Scope
    /// lifecycle").
    pub fn child(&self) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScopeData {
                bindings: Vec::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn parent(&self) -> Option<Environment> {
        self.inner.lock().unwrap_or_else(|p| p.into_inner()).parent.clone()
    }

    /// `define` rejects a duplicate name in the *innermost* scope only
    /// (spec.md §4.3).
    pub fn define(&self, name: &str, value: Value, is_const: bool) -> Result<(), RuntimeError> {
        let mut scope = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        if scope.bindings.iter().any(|b| b.name == name) {
            return Err(RuntimeError::undefined(format!(
                "'{name}' is already defined in this scope"
            )));
        }
        scope.bindings.push(Binding {
            name: name.to_string(),
            value,
            is_const,
        });
        Ok(())
    }

    /// `assign` walks the parent chain; if no binding is found anywhere, it
    /// implicitly defines a new mutable binding in the innermost scope
    /// (spec.md §4.3, "this implicit-define rule is required for
    /// compatibility with loop/async patterns in the source").
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut frame = self.clone();
        loop {
            let mut scope = frame.inner.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(binding) = scope.bindings.iter_mut().find(|b| b.name == name) {
                if binding.is_const {
                    return Err(RuntimeError::undefined(format!(
                        "cannot assign to const '{name}'"
                    )));
                }
                binding.value = value;
                return Ok(());
            }
            let next = scope.parent.clone();
            drop(scope);
            match next {
                Some(parent) => frame = parent,
                None => break,
            }
        }
        let mut scope = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        scope.bindings.push(Binding {
            name: name.to_string(),
            value,
            is_const: false,
        });
        Ok(())
    }

    /// Name-based lookup, walking parent links (spec.md §4.3).
    pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
        let mut frame = self.clone();
        loop {
            let scope = frame.inner.lock().unwrap_or_else(|p| p.into_inner());
            if let Some(binding) = scope.bindings.iter().find(|b| b.name == name) {
                return Ok(binding.value.clone());
            }
            let next = scope.parent.clone();
            drop(scope);
            match next {
                Some(parent) => frame = parent,
                None => {
                    return Err(RuntimeError::undefined(format!("undefined variable '{name}'")));
                }
            }
        }
    }

    /// Resolver fast-path: walk exactly `depth` parent links, then index
    /// directly into that scope's binding slot (spec.md §4.3 "Fast-path").
    /// Both paths must observe the same value; callers that hold a stale
    /// `(depth, slot)` after a preceding `define` get an out-of-bounds
    /// error rather than silently reading the wrong slot.
    pub fn lookup_resolved(&self, depth: usize, slot: usize) -> Result<Value, RuntimeError> {
        let mut frame = self.clone();
        for _ in 0..depth {
            let parent = frame
                .inner
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .parent
                .clone()
                .ok_or_else(|| RuntimeError::undefined("resolved lookup depth exceeds scope chain"))?;
            frame = parent;
        }
        let scope = frame.inner.lock().unwrap_or_else(|p| p.into_inner());
        scope
            .bindings
            .get(slot)
            .map(|b| b.value.clone())
            .ok_or_else(|| RuntimeError::undefined("resolved lookup slot out of range"))
    }

    pub fn assign_resolved(&self, depth: usize, slot: usize, value: Value) -> Result<(), RuntimeError> {
        let mut frame = self.clone();
        for _ in 0..depth {
            let parent = frame
                .inner
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .parent
                .clone()
                .ok_or_else(|| RuntimeError::undefined("resolved assign depth exceeds scope chain"))?;
            frame = parent;
        }
        let mut scope = frame.inner.lock().unwrap_or_else(|p| p.into_inner());
        let binding = scope
            .bindings
            .get_mut(slot)
            .ok_or_else(|| RuntimeError::undefined("resolved assign slot out of range"))?;
        if binding.is_const {
            return Err(RuntimeError::undefined(format!(
                "cannot assign to const '{}'",
                binding.name
            )));
        }
        binding.value = value;
        Ok(())
    }

    /// Stable identity, used by `Runtime::stats` and tests; two handles to
    /// the same scope compare equal.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_isolation_restores_outer_binding() {
        let root = Environment::root();
        root.define("x", Value::I64(1), false).unwrap();
        let inner = root.child();
        inner.define("x", Value::I64(2), false).unwrap();
        assert_eq!(inner.lookup("x").unwrap(), Value::I64(2));
        assert_eq!(root.lookup("x").unwrap(), Value::I64(1));
    }

    #[test]
    fn define_rejects_duplicate_in_same_scope() {
        let scope = Environment::root();
        scope.define("x", Value::I64(1), false).unwrap();
        assert!(scope.define("x", Value::I64(2), false).is_err());
    }

    #[test]
    fn assign_to_const_fails() {
        let scope = Environment::root();
        scope.define("x", Value::I64(1), true).unwrap();
        assert!(scope.assign("x", Value::I64(2)).is_err());
    }

    #[test]
    fn assign_walks_parent_chain() {
        let root = Environment::root();
        root.define("x", Value::I64(1), false).unwrap();
        let inner = root.child();
        inner.assign("x", Value::I64(9)).unwrap();
        assert_eq!(root.lookup("x").unwrap(), Value::I64(9));
    }

    #[test]
    fn assign_with_no_existing_binding_implicitly_defines() {
        let scope = Environment::root();
        scope.assign("y", Value::I64(5)).unwrap();
        assert_eq!(scope.lookup("y").unwrap(), Value::I64(5));
    }

    #[test]
    fn lookup_unknown_fails() {
        let scope = Environment::root();
        assert!(scope.lookup("nope").is_err());
    }

    #[test]
    fn captured_scope_writes_are_visible_through_shared_handle() {
        let scope = Environment::root();
        scope.define("shared", Value::I64(1), false).unwrap();
        let captured = scope.clone();
        scope.assign("shared", Value::I64(2)).unwrap();
        assert_eq!(captured.lookup("shared").unwrap(), Value::I64(2));
    }

    #[test]
    fn resolved_fast_path_agrees_with_name_lookup() {
        let root = Environment::root();
        root.define("a", Value::I64(10), false).unwrap();
        let inner = root.child();
        inner.define("b", Value::I64(20), false).unwrap();
        assert_eq!(inner.lookup_resolved(0, 0).unwrap(), Value::I64(20));
        assert_eq!(inner.lookup_resolved(1, 0).unwrap(), Value::I64(10));
        assert_eq!(inner.lookup("a").unwrap(), inner.lookup_resolved(1, 0).unwrap());
    }
}
