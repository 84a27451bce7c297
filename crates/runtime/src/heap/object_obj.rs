//! `ObjectObj`: an ordered name→value record (spec.md §3, §4.5).
//!
//! Field order is insertion order and is preserved across overwrite (T10,
//! "Object field order"): setting an existing field updates it in place
//! rather than moving it to the end. Lookup is linear, matching the spec's
//! explicit "field lookup is linear" note — these records are expected to
//! be small.

use std::sync::{Mutex, MutexGuard};

use crate::value::Value;

pub struct ObjectObj {
    type_name: Option<String>,
    entries: Mutex<Vec<(String, Value)>>,
}

impl ObjectObj {
    pub fn new(type_name: Option<String>) -> Self {
        Self {
            type_name,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn from_entries(type_name: Option<String>, entries: Vec<(String, Value)>) -> Self {
        let mut out: Vec<(String, Value)> = Vec::with_capacity(entries.len());
        for (name, value) in entries {
            if let Some(slot) = out.iter_mut().find(|(n, _)| *n == name) {
                slot.1 = value;
            } else {
                out.push((name, value));
            }
        }
        Self {
            type_name,
            entries: Mutex::new(out),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<(String, Value)>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.lock().iter().find(|(n, _)| n == name).map(|(_, v)| v.clone())
    }

    /// Insertion-order set: overwrites an existing field in place, appends a
    /// new one at the end.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        let name = name.into();
        let mut entries = self.lock();
        if let Some(slot) = entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            entries.push((name, value));
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.lock().iter().any(|(n, _)| n == name)
    }

    pub fn delete(&self, name: &str) -> Option<Value> {
        let mut entries = self.lock();
        if let Some(pos) = entries.iter().position(|(n, _)| n == name) {
            Some(entries.remove(pos).1)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of fields in insertion order.
    pub fn entries_snapshot(&self) -> Vec<(String, Value)> {
        self.lock().clone()
    }
}

impl std::fmt::Debug for ObjectObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectObj")
            .field("type_name", &self.type_name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_preserves_position() {
        let o = ObjectObj::new(None);
        o.set("a", Value::I64(1));
        o.set("b", Value::I64(2));
        o.set("a", Value::I64(99));
        let names: Vec<String> = o
            .entries_snapshot()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(o.get("a"), Some(Value::I64(99)));
    }

    #[test]
    fn delete_removes_field() {
        let o = ObjectObj::new(None);
        o.set("a", Value::I64(1));
        assert!(o.delete("a").is_some());
        assert!(!o.has("a"));
    }

    #[test]
    fn duplicate_construction_entries_overwrite() {
        let o = ObjectObj::from_entries(
            None,
            vec![
                ("a".to_string(), Value::I64(1)),
                ("a".to_string(), Value::I64(2)),
            ],
        );
        assert_eq!(o.len(), 1);
        assert_eq!(o.get("a"), Some(Value::I64(2)));
    }
}
