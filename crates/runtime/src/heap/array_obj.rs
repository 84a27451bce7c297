//! `ArrayObj`: a growable vector of `Value`, optionally type-constrained
//! (spec.md §3, §4.5).
//!
//! Every element stored here is a retained handle; `push`/`set`/`insert`
//! retain the incoming value and the corresponding removal methods release
//! the outgoing one — ordinary `Value: Clone`/`Drop` already does this, so
//! the methods below just move values in and out of the `Vec` the way any
//! owning Rust container would.

use std::sync::{Mutex, MutexGuard};

use hemlock_core::error::RuntimeError;

use crate::value::{Value, ValueTag};

pub struct ArrayObj {
    elements: Mutex<Vec<Value>>,
    element_type: Option<ValueTag>,
}

impl ArrayObj {
    pub fn new(elements: Vec<Value>) -> Self {
        Self {
            elements: Mutex::new(elements),
            element_type: None,
        }
    }

    pub fn typed(elements: Vec<Value>, element_type: ValueTag) -> Result<Self, RuntimeError> {
        for v in &elements {
            if v.tag() != element_type {
                return Err(RuntimeError::type_error(format!(
                    "typed array expects {element_type:?}, found {:?}",
                    v.tag()
                )));
            }
        }
        Ok(Self {
            elements: Mutex::new(elements),
            element_type: Some(element_type),
        })
    }

    /// No method call spans more than one lock acquisition — see spec.md §5
    /// ("the implementation must not silently lock on method calls"), which
    /// this crate reads as "no cross-call atomicity", not "no synchronization
    /// at all"; a bare `Vec` behind `unsafe impl Sync` would be unsound the
    /// moment two tasks share the same retained array.
    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<Value>> {
        self.elements.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_type(&self, v: &Value) -> Result<(), RuntimeError> {
        if let Some(t) = self.element_type {
            if v.tag() != t {
                return Err(RuntimeError::type_error(format!(
                    "typed array expects {t:?}, found {:?}",
                    v.tag()
                )));
            }
        }
        Ok(())
    }

    pub fn length(&self) -> usize {
        self.lock().len()
    }

    pub fn element_type(&self) -> Option<ValueTag> {
        self.element_type
    }

    pub fn push(&self, v: Value) -> Result<(), RuntimeError> {
        self.check_type(&v)?;
        self.lock().push(v);
        Ok(())
    }

    pub fn pop(&self) -> Option<Value> {
        self.lock().pop()
    }

    pub fn shift(&self) -> Option<Value> {
        let mut elems = self.lock();
        if elems.is_empty() {
            None
        } else {
            Some(elems.remove(0))
        }
    }

    pub fn unshift(&self, v: Value) -> Result<(), RuntimeError> {
        self.check_type(&v)?;
        self.lock().insert(0, v);
        Ok(())
    }

    pub fn insert(&self, index: i64, v: Value) -> Result<(), RuntimeError> {
        self.check_type(&v)?;
        let mut elems = self.lock();
        let len = elems.len();
        if index < 0 || index as usize > len {
            return Err(RuntimeError::range(format!(
                "insert index {index} out of range for length {len}"
            )));
        }
        elems.insert(index as usize, v);
        Ok(())
    }

    pub fn remove(&self, index: i64) -> Result<Value, RuntimeError> {
        let mut elems = self.lock();
        let len = elems.len();
        if index < 0 || index as usize >= len {
            return Err(RuntimeError::range(format!(
                "remove index {index} out of range for length {len}"
            )));
        }
        Ok(elems.remove(index as usize))
    }

    pub fn get(&self, index: i64) -> Result<Value, RuntimeError> {
        let elems = self.lock();
        if index < 0 || index as usize >= elems.len() {
            return Err(RuntimeError::range(format!(
                "array index {index} out of range for length {}",
                elems.len()
            )));
        }
        Ok(elems[index as usize].clone())
    }

    pub fn set(&self, index: i64, v: Value) -> Result<(), RuntimeError> {
        self.check_type(&v)?;
        let mut elems = self.lock();
        let len = elems.len();
        if index < 0 || index as usize >= len {
            return Err(RuntimeError::range(format!(
                "array index {index} out of range for length {len}"
            )));
        }
        elems[index as usize] = v;
        Ok(())
    }

    pub fn first(&self) -> Option<Value> {
        self.lock().first().cloned()
    }

    pub fn last(&self) -> Option<Value> {
        self.lock().last().cloned()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn find(&self, needle: &Value) -> Option<i64> {
        self.lock().iter().position(|v| v.equal(needle)).map(|i| i as i64)
    }

    pub fn contains(&self, needle: &Value) -> bool {
        self.lock().iter().any(|v| v.equal(needle))
    }

    /// Clamping slice per spec.md §4.5.
    pub fn slice(&self, start: i64, end: i64) -> Vec<Value> {
        let elems = self.lock();
        let len = elems.len() as i64;
        let start = start.clamp(0, len) as usize;
        let end = end.clamp(0, len) as usize;
        if start >= end {
            return Vec::new();
        }
        elems[start..end].to_vec()
    }

    pub fn join(&self, sep: &str) -> String {
        self.lock().iter().map(|v| v.to_display_string()).collect::<Vec<_>>().join(sep)
    }

    pub fn concat(&self, other: &ArrayObj) -> Vec<Value> {
        let mut out = self.lock().clone();
        out.extend(other.lock().iter().cloned());
        out
    }

    pub fn reverse(&self) {
        self.lock().reverse();
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.lock().clone()
    }
}

impl std::fmt::Debug for ArrayObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayObj")
            .field("length", &self.length())
            .field("element_type", &self.element_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_round_trip() {
        let a = ArrayObj::new(vec![]);
        a.push(Value::I64(1)).unwrap();
        a.push(Value::I64(2)).unwrap();
        assert_eq!(a.length(), 2);
        assert_eq!(a.pop(), Some(Value::I64(2)));
    }

    #[test]
    fn typed_array_rejects_mismatched_insert() {
        let a = ArrayObj::typed(vec![Value::I64(1)], ValueTag::I64).unwrap();
        assert!(a.push(Value::Bool(true)).is_err());
        assert!(a.push(Value::I64(2)).is_ok());
    }

    #[test]
    fn slice_clamps_out_of_range() {
        let a = ArrayObj::new(vec![Value::I64(1), Value::I64(2), Value::I64(3)]);
        let s = a.slice(1, 100);
        assert_eq!(s, vec![Value::I64(2), Value::I64(3)]);
    }

    #[test]
    fn get_out_of_range_errors() {
        let a = ArrayObj::new(vec![Value::I64(1)]);
        assert!(a.get(5).is_err());
    }
}
