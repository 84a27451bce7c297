//! `StringObj`: mutable UTF-8(-ish) bytes with a lazily recomputed character
//! count (spec.md §3, §9 "String mutability and `char_length` cache").
//!
//! Byte-level writes can produce invalid UTF-8 transiently (spec.md allows
//! indexing/assignment by raw byte), so storage is a plain `Vec<u8>` and
//! character counting falls back to lossy decoding rather than assuming
//! validity.
//!
//! Mutating methods take `&self` and reach through a `Mutex`, matching the
//! rest of the heap object family: Hemlock method calls on a shared handle
//! are not internally *atomic across calls* (spec.md §5, "the implementation
//! must not silently lock on method calls" — no cross-call transaction), but
//! each call still needs real synchronization underneath or two tasks
//! sharing a retained string race on the same `Vec`'s buffer pointer, which
//! is undefined behavior, not just a surprising result.

use std::sync::{Mutex, MutexGuard};

use hemlock_core::error::RuntimeError;

const STALE: i64 = -1;

struct Inner {
    bytes: Vec<u8>,
    char_len_cache: i64,
}

pub struct StringObj {
    inner: Mutex<Inner>,
}

impl StringObj {
    pub fn new(s: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Mutex::new(Inner { bytes: s.into(), char_len_cache: STALE }),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn byte_length(&self) -> usize {
        self.lock().bytes.len()
    }

    /// Recomputes and caches if stale; lossy-decodes so a transiently
    /// invalid byte sequence still yields a count instead of panicking.
    pub fn char_length(&self) -> usize {
        let mut inner = self.lock();
        if inner.char_len_cache >= 0 {
            return inner.char_len_cache as usize;
        }
        let count = String::from_utf8_lossy(&inner.bytes).chars().count();
        inner.char_len_cache = count as i64;
        count
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.lock().bytes.clone()
    }

    /// Lossy UTF-8 view for display/printing and methods that operate on
    /// characters.
    pub fn as_str_lossy(&self) -> String {
        String::from_utf8_lossy(&self.lock().bytes).into_owned()
    }

    pub fn byte_at(&self, index: i64) -> Result<u8, RuntimeError> {
        let inner = self.lock();
        if index < 0 || index as usize >= inner.bytes.len() {
            return Err(RuntimeError::range(format!(
                "byte_at: index {index} out of range for length {}",
                inner.bytes.len()
            )));
        }
        Ok(inner.bytes[index as usize])
    }

    pub fn set_byte(&self, index: i64, value: i64) -> Result<(), RuntimeError> {
        let mut inner = self.lock();
        let len = inner.bytes.len();
        if index < 0 || index as usize >= len {
            return Err(RuntimeError::range(format!(
                "string index {index} out of range for length {len}"
            )));
        }
        if !(0..=255).contains(&value) {
            return Err(RuntimeError::range(format!(
                "byte value {value} out of range [0,255]"
            )));
        }
        inner.bytes[index as usize] = value as u8;
        inner.char_len_cache = STALE;
        Ok(())
    }

    pub fn char_at(&self, index: i64) -> Result<char, RuntimeError> {
        if index < 0 {
            return Err(RuntimeError::range(format!("char_at: negative index {index}")));
        }
        self.as_str_lossy()
            .chars()
            .nth(index as usize)
            .ok_or_else(|| {
                RuntimeError::range(format!(
                    "char_at: index {index} out of range for char_length {}",
                    self.char_length()
                ))
            })
    }

    /// Clamping slice by byte index, per spec.md §4.5 bounds policy.
    pub fn slice(&self, start: i64, end: Option<i64>) -> Vec<u8> {
        let inner = self.lock();
        let len = inner.bytes.len() as i64;
        let start = start.clamp(0, len) as usize;
        let end = end.unwrap_or(len).clamp(0, len) as usize;
        if start >= end {
            return Vec::new();
        }
        inner.bytes[start..end].to_vec()
    }

    /// Clamping substring by character index + count.
    pub fn substr(&self, start: i64, count: Option<i64>) -> String {
        let chars: Vec<char> = self.as_str_lossy().chars().collect();
        let len = chars.len() as i64;
        let start = start.clamp(0, len) as usize;
        let end = match count {
            Some(c) => (start as i64 + c.max(0)).clamp(0, len) as usize,
            None => len as usize,
        };
        if start >= end {
            return String::new();
        }
        chars[start..end].iter().collect()
    }

    pub fn split(&self, sep: &str) -> Vec<String> {
        let s = self.as_str_lossy();
        if sep.is_empty() {
            return s.chars().map(|c| c.to_string()).collect();
        }
        s.split(sep).map(|p| p.to_string()).collect()
    }

    pub fn find(&self, needle: &str) -> Option<i64> {
        self.as_str_lossy().find(needle).map(|byte_idx| {
            // Report a char index, consistent with char_at/substr semantics.
            self.as_str_lossy()[..byte_idx].chars().count() as i64
        })
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.as_str_lossy().contains(needle)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.as_str_lossy().starts_with(prefix)
    }

    pub fn ends_with(&self, suffix: &str) -> bool {
        self.as_str_lossy().ends_with(suffix)
    }

    pub fn trim(&self) -> String {
        self.as_str_lossy().trim().to_string()
    }

    pub fn to_upper(&self) -> String {
        self.as_str_lossy().to_uppercase()
    }

    pub fn to_lower(&self) -> String {
        self.as_str_lossy().to_lowercase()
    }

    pub fn replace(&self, old: &str, new: &str) -> String {
        self.as_str_lossy().replace(old, new)
    }

    pub fn repeat(&self, n: i64) -> String {
        if n <= 0 {
            return String::new();
        }
        self.as_str_lossy().repeat(n as usize)
    }

    pub fn set_contents(&self, bytes: Vec<u8>) {
        let mut inner = self.lock();
        inner.bytes = bytes;
        inner.char_len_cache = STALE;
    }
}

impl std::fmt::Debug for StringObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StringObj")
            .field("byte_length", &self.byte_length())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_write_invalidates_char_cache() {
        let s = StringObj::new("hello");
        assert_eq!(s.char_length(), 5);
        s.set_byte(0, b'H' as i64).unwrap();
        assert_eq!(s.as_str_lossy(), "Hello");
        assert_eq!(s.char_length(), 5);
    }

    #[test]
    fn slice_clamps_out_of_range_end() {
        let s = StringObj::new("hello");
        assert_eq!(s.slice(1, Some(100)), b"ello");
    }

    #[test]
    fn byte_at_errors_on_out_of_range() {
        let s = StringObj::new("hi");
        assert!(s.byte_at(5).is_err());
        assert!(s.byte_at(-1).is_err());
    }

    #[test]
    fn char_at_errors_on_out_of_range() {
        let s = StringObj::new("hi");
        assert!(s.char_at(5).is_err());
    }

    #[test]
    fn substr_clamps() {
        let s = StringObj::new("hello world");
        assert_eq!(s.substr(6, Some(100)), "world");
        assert_eq!(s.substr(-5, Some(3)), "hel");
    }
}
