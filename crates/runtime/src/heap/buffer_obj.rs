//! `BufferObj`: a fixed-size, bounds-checked byte array (spec.md §3, §4.5).
//!
//! Unlike `StringObj`, a buffer never resizes itself; `capacity` is set at
//! construction and `length` never exceeds it. Indexed access works in
//! `[0,255]` integers rather than UTF-8, so there is no character cache to
//! invalidate.

use std::sync::{Mutex, MutexGuard};

use hemlock_core::error::RuntimeError;

pub struct BufferObj {
    bytes: Mutex<Vec<u8>>,
    capacity: usize,
}

impl BufferObj {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Mutex::new(vec![0u8; capacity]),
            capacity,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let capacity = bytes.len();
        Self {
            bytes: Mutex::new(bytes),
            capacity,
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn length(&self) -> usize {
        self.lock().len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn get(&self, index: i64) -> Result<u8, RuntimeError> {
        let bytes = self.lock();
        if index < 0 || index as usize >= bytes.len() {
            return Err(RuntimeError::range(format!(
                "buffer index {index} out of range for length {}",
                bytes.len()
            )));
        }
        Ok(bytes[index as usize])
    }

    pub fn set(&self, index: i64, value: i64) -> Result<(), RuntimeError> {
        let mut bytes = self.lock();
        let len = bytes.len();
        if index < 0 || index as usize >= len {
            return Err(RuntimeError::range(format!(
                "buffer index {index} out of range for length {len}"
            )));
        }
        if !(0..=255).contains(&value) {
            return Err(RuntimeError::range(format!(
                "buffer byte {value} out of range [0,255]"
            )));
        }
        bytes[index as usize] = value as u8;
        Ok(())
    }

    /// New buffer holding the clamped `[start,end)` slice (spec.md §4.5).
    pub fn slice(&self, start: i64, end: i64) -> BufferObj {
        let bytes = self.lock();
        let len = bytes.len() as i64;
        let start = start.clamp(0, len) as usize;
        let end = end.clamp(0, len) as usize;
        if start >= end {
            return BufferObj::with_capacity(0);
        }
        BufferObj::from_bytes(bytes[start..end].to_vec())
    }

    pub fn as_bytes(&self) -> Vec<u8> {
        self.lock().clone()
    }
}

impl std::fmt::Debug for BufferObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferObj")
            .field("length", &self.length())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_set_round_trip() {
        let b = BufferObj::with_capacity(4);
        b.set(0, 255).unwrap();
        assert_eq!(b.get(0).unwrap(), 255);
    }

    #[test]
    fn set_rejects_out_of_range_byte() {
        let b = BufferObj::with_capacity(4);
        assert!(b.set(0, 256).is_err());
        assert!(b.set(0, -1).is_err());
    }

    #[test]
    fn index_out_of_range_is_an_error() {
        let b = BufferObj::with_capacity(2);
        assert!(b.get(2).is_err());
    }

    #[test]
    fn slice_clamps() {
        let b = BufferObj::from_bytes(vec![1, 2, 3, 4]);
        let s = b.slice(-5, 2);
        assert_eq!(s.as_bytes(), vec![1, 2]);
        let s2 = b.slice(1, 100);
        assert_eq!(s2.as_bytes(), vec![2, 3, 4]);
    }
}
