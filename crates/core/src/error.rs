//! Runtime error taxonomy
//!
//! Every fallible operation in the Hemlock execution core returns
//! `Result<T, Thrown>`. `Thrown` wraps whatever travels up through `try`/
//! `catch`; for builtin- and evaluator-originated errors that value is built
//! from a `RuntimeError`, but a `throw expr` statement can wrap any value at
//! all (spec.md §7, "User throw").
//!
//! `hemlock-runtime` is the crate that knows how to turn a `RuntimeError`
//! into a `Value` (it owns the `Value` type), so this module only defines
//! the taxonomy and the message; the `Value` wrapping happens one layer up.

use std::fmt;

/// The nine-member error taxonomy from spec.md §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation on incompatible type (e.g. `slice()` on an integer).
    Type,
    /// Numeric out of declared width, index out of bounds, bad code point.
    Range,
    /// Too few required arguments, or too many without a rest parameter.
    Arity,
    /// Unknown identifier, assignment to const, duplicate define.
    Undefined,
    /// `free` on a shared handle, use-after-free, allocation failure.
    Memory,
    /// Filesystem/socket/channel/file operation failure.
    Io,
    /// Double join, join of a detached task, send to a closed channel,
    /// spawn of a non-async function.
    Concurrency,
    /// A value thrown by `throw`; not produced internally.
    UserThrow,
    /// Malformed JSON or malformed literal during `deserialize`.
    ParseOrDeserialize,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Type => "type error",
            ErrorKind::Range => "range error",
            ErrorKind::Arity => "arity error",
            ErrorKind::Undefined => "undefined/const error",
            ErrorKind::Memory => "memory error",
            ErrorKind::Io => "i/o error",
            ErrorKind::Concurrency => "concurrency error",
            ErrorKind::UserThrow => "user throw",
            ErrorKind::ParseOrDeserialize => "parse error",
        };
        f.write_str(s)
    }
}

/// A catchable runtime error: a kind from the taxonomy plus a human message.
///
/// This is the shape builtins and the evaluator raise with. It is converted
/// to a throwable `Value` at the call site in `hemlock-runtime` (usually
/// `Value::String`, see spec.md §6's "Runtime error: <message>" framing).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn range(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    pub fn undefined(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Undefined, message)
    }

    pub fn memory(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Memory, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn concurrency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Concurrency, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseOrDeserialize, message)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RuntimeError {}

/// Marker wrapping a generic payload `V` (normally `hemlock_runtime::Value`)
/// that is currently propagating as an exception.
///
/// Kept generic over the payload type so `hemlock-core` need not know about
/// `Value`; `hemlock-runtime` specializes this as `Thrown<Value>` and
/// provides `From<RuntimeError> for Thrown<Value>`.
#[derive(Debug, Clone)]
pub struct Thrown<V>(pub V);

impl<V> Thrown<V> {
    pub fn into_inner(self) -> V {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_message_not_kind() {
        let err = RuntimeError::range("index 5 out of bounds for length 3");
        assert_eq!(err.to_string(), "index 5 out of bounds for length 3");
        assert_eq!(err.kind, ErrorKind::Range);
    }

    #[test]
    fn constructors_set_expected_kind() {
        assert_eq!(RuntimeError::type_error("x").kind, ErrorKind::Type);
        assert_eq!(RuntimeError::arity("x").kind, ErrorKind::Arity);
        assert_eq!(RuntimeError::undefined("x").kind, ErrorKind::Undefined);
        assert_eq!(RuntimeError::memory("x").kind, ErrorKind::Memory);
        assert_eq!(RuntimeError::io("x").kind, ErrorKind::Io);
        assert_eq!(RuntimeError::concurrency("x").kind, ErrorKind::Concurrency);
        assert_eq!(RuntimeError::parse("x").kind, ErrorKind::ParseOrDeserialize);
    }
}
