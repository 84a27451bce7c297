//! `FileObj`: a handle to an open file (spec.md §3, §4.5).
//!
//! The execution core does not itself decide *which* filesystem calls a
//! standard-library builtin makes (spec.md §1, filesystem access is an
//! external collaborator) — this type just carries the already-open
//! `std::fs::File`, the path/mode it was opened with, and an idempotent
//! close flag, so builtins have somewhere to keep that state between calls.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::{Mutex, MutexGuard};

use hemlock_core::error::RuntimeError;

pub struct FileObj {
    pub path: String,
    pub mode: String,
    handle: Mutex<Option<File>>,
}

impl FileObj {
    pub fn new(path: impl Into<String>, mode: impl Into<String>, handle: File) -> Self {
        Self {
            path: path.into(),
            mode: mode.into(),
            handle: Mutex::new(Some(handle)),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.handle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    fn with_open<T>(&self, f: impl FnOnce(&mut File) -> std::io::Result<T>) -> Result<T, RuntimeError> {
        let mut guard = self.lock();
        let file = guard
            .as_mut()
            .ok_or_else(|| RuntimeError::io(format!("file '{}' is closed", self.path)))?;
        f(file).map_err(|e| RuntimeError::io(format!("'{}': {e}", self.path)))
    }

    pub fn read(&self) -> Result<String, RuntimeError> {
        self.with_open(|f| {
            let mut s = String::new();
            f.read_to_string(&mut s)?;
            Ok(s)
        })
    }

    pub fn read_bytes(&self, n: usize) -> Result<Vec<u8>, RuntimeError> {
        self.with_open(|f| {
            let mut buf = vec![0u8; n];
            let read = f.read(&mut buf)?;
            buf.truncate(read);
            Ok(buf)
        })
    }

    pub fn write(&self, s: &str) -> Result<(), RuntimeError> {
        self.with_open(|f| f.write_all(s.as_bytes()))
    }

    pub fn seek(&self, pos: i64) -> Result<u64, RuntimeError> {
        self.with_open(|f| f.seek(SeekFrom::Start(pos.max(0) as u64)))
    }

    /// Idempotent (spec.md §3): closing an already-closed file is a no-op,
    /// not an error.
    pub fn close(&self) -> Result<(), RuntimeError> {
        *self.lock() = None;
        Ok(())
    }
}

impl std::fmt::Debug for FileObj {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileObj")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .field("closed", &self.is_closed())
            .finish()
    }
}
