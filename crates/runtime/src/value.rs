//! `Value`: the tagged union every runtime quantity is (spec.md §3 "Value
//! (tagged union)", §4.1).
//!
//! Primitives are inline; everything else is a strong `hemlock_core::Handle`
//! to a heap object, so cloning a `Value` is always cheap and `Drop`ping one
//! always releases exactly the references it holds — ordinary Rust
//! ownership gives us spec.md's retain/release bookkeeping for free (see
//! `hemlock-core::handle` module doc).

use std::sync::Arc;

use hemlock_core::handle::Handle;
use hemlock_core::numeric::IntWidth;

use crate::environment::Environment;
use crate::error::Thrown;
use crate::heap::{ArrayObj, BufferObj, ChannelObj, FileObj, FunctionObj, ObjectObj, StringObj, TaskObj};

/// Type tag used for `truthiness`/`equal` dispatch, typed-array element
/// constraints, and the `Type` value variant itself (spec.md §3, §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Rune,
    Null,
    Type,
    Ptr,
    String,
    Buffer,
    Array,
    Object,
    Function,
    Task,
    Channel,
    File,
    BuiltinFn,
}

/// A registered builtin (spec.md §6, "Built-in registry"): name, arity,
/// variadic flag, and an implementation pointer, plus an optional captured
/// environment for builtins that close over state (spec.md §3's `BuiltinFn`
/// row — "function pointer + arity + optional captured env").
#[derive(Clone)]
pub struct BuiltinFnValue {
    pub name: Arc<str>,
    pub arity: usize,
    pub variadic: bool,
    pub implementation: Arc<dyn Fn(&[Value]) -> Result<Value, Thrown> + Send + Sync>,
    pub captured_env: Option<Environment>,
}

impl std::fmt::Debug for BuiltinFnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinFnValue")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("variadic", &self.variadic)
            .finish()
    }
}

impl PartialEq for BuiltinFnValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.implementation, &other.implementation)
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Rune(u32),
    Null,
    Type(ValueTag),
    /// Raw address plus a size hint for manual-free bookkeeping (spec.md §3
    /// "Ptr"); no Rust-level allocation backs this directly, see
    /// `crate::ptr_alloc`.
    Ptr { address: usize, size_hint: usize },
    String(Handle<StringObj>),
    Buffer(Handle<BufferObj>),
    Array(Handle<ArrayObj>),
    Object(Handle<ObjectObj>),
    Function(Handle<FunctionObj>),
    Task(Handle<TaskObj>),
    Channel(Handle<ChannelObj>),
    File(Handle<FileObj>),
    BuiltinFn(BuiltinFnValue),
}

impl Value {
    pub fn string(s: impl Into<Vec<u8>>) -> Self {
        Value::String(Handle::new(StringObj::new(s)))
    }

    pub fn new_array(elements: Vec<Value>) -> Self {
        Value::Array(Handle::new(ArrayObj::new(elements)))
    }

    pub fn new_object(obj: ObjectObj) -> Self {
        Value::Object(Handle::new(obj))
    }

    pub fn new_buffer(obj: BufferObj) -> Self {
        Value::Buffer(Handle::new(obj))
    }

    pub fn tag(&self) -> ValueTag {
        match self {
            Value::I8(_) => ValueTag::I8,
            Value::I16(_) => ValueTag::I16,
            Value::I32(_) => ValueTag::I32,
            Value::I64(_) => ValueTag::I64,
            Value::U8(_) => ValueTag::U8,
            Value::U16(_) => ValueTag::U16,
            Value::U32(_) => ValueTag::U32,
            Value::U64(_) => ValueTag::U64,
            Value::F32(_) => ValueTag::F32,
            Value::F64(_) => ValueTag::F64,
            Value::Bool(_) => ValueTag::Bool,
            Value::Rune(_) => ValueTag::Rune,
            Value::Null => ValueTag::Null,
            Value::Type(_) => ValueTag::Type,
            Value::Ptr { .. } => ValueTag::Ptr,
            Value::String(_) => ValueTag::String,
            Value::Buffer(_) => ValueTag::Buffer,
            Value::Array(_) => ValueTag::Array,
            Value::Object(_) => ValueTag::Object,
            Value::Function(_) => ValueTag::Function,
            Value::Task(_) => ValueTag::Task,
            Value::Channel(_) => ValueTag::Channel,
            Value::File(_) => ValueTag::File,
            Value::BuiltinFn(_) => ValueTag::BuiltinFn,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self.tag(),
            ValueTag::I8
                | ValueTag::I16
                | ValueTag::I32
                | ValueTag::I64
                | ValueTag::U8
                | ValueTag::U16
                | ValueTag::U32
                | ValueTag::U64
                | ValueTag::F32
                | ValueTag::F64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    /// Best-effort widening to `f64`, used by the evaluator's numeric
    /// promotion (spec.md §4.1).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I8(n) => Some(*n as f64),
            Value::I16(n) => Some(*n as f64),
            Value::I32(n) => Some(*n as f64),
            Value::I64(n) => Some(*n as f64),
            Value::U8(n) => Some(*n as f64),
            Value::U16(n) => Some(*n as f64),
            Value::U32(n) => Some(*n as f64),
            Value::U64(n) => Some(*n as f64),
            Value::F32(n) => Some(*n as f64),
            Value::F64(n) => Some(*n),
            _ => None,
        }
    }

    /// Best-effort narrowing to `i64`, used for integer-lane arithmetic.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(n) => Some(*n as i64),
            Value::I16(n) => Some(*n as i64),
            Value::I32(n) => Some(*n as i64),
            Value::I64(n) => Some(*n),
            Value::U8(n) => Some(*n as i64),
            Value::U16(n) => Some(*n as i64),
            Value::U32(n) => Some(*n as i64),
            Value::U64(n) => Some(*n as i64),
            _ => None,
        }
    }

    /// `IntWidth` of an integer-tagged value, for range checks on
    /// assignment (spec.md §4.1); `None` for floats and non-numerics.
    pub fn int_width(&self) -> Option<IntWidth> {
        match self {
            Value::I8(_) => Some(IntWidth::I8),
            Value::I16(_) => Some(IntWidth::I16),
            Value::I32(_) => Some(IntWidth::I32),
            Value::I64(_) => Some(IntWidth::I64),
            Value::U8(_) => Some(IntWidth::U8),
            Value::U16(_) => Some(IntWidth::U16),
            Value::U32(_) => Some(IntWidth::U32),
            Value::U64(_) => Some(IntWidth::U64),
            _ => None,
        }
    }

    /// `truthiness(v)` (spec.md §4.1): false for `Null`, `Bool(false)`,
    /// numeric zero, empty string, empty array, empty object; true
    /// otherwise.
    pub fn truthiness(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::I8(n) => *n != 0,
            Value::I16(n) => *n != 0,
            Value::I32(n) => *n != 0,
            Value::I64(n) => *n != 0,
            Value::U8(n) => *n != 0,
            Value::U16(n) => *n != 0,
            Value::U32(n) => *n != 0,
            Value::U64(n) => *n != 0,
            Value::F32(n) => *n != 0.0,
            Value::F64(n) => *n != 0.0,
            Value::Rune(r) => *r != 0,
            Value::String(h) => h.get().map(|s| s.byte_length() != 0).unwrap_or(false),
            Value::Array(h) => h.get().map(|a| a.length() != 0).unwrap_or(false),
            Value::Object(h) => h.get().map(|o| !o.is_empty()).unwrap_or(false),
            _ => true,
        }
    }

    /// `equal(a,b)` (spec.md §4.1): deep for arrays/objects/strings
    /// (byte-wise), pointer-identity for functions/tasks/channels/files,
    /// promoting numeric comparison across numeric tags, `false` across
    /// disjoint non-numeric types.
    pub fn equal(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Rune(a), Rune(b)) => a == b,
            (Type(a), Type(b)) => a == b,
            (Ptr { address: a, .. }, Ptr { address: b, .. }) => a == b,
            (String(a), String(b)) => match (a.get(), b.get()) {
                (Ok(sa), Ok(sb)) => sa.as_bytes() == sb.as_bytes(),
                _ => false,
            },
            (Buffer(a), Buffer(b)) => match (a.get(), b.get()) {
                (Ok(ba), Ok(bb)) => ba.as_bytes() == bb.as_bytes(),
                _ => false,
            },
            (Array(a), Array(b)) => match (a.get(), b.get()) {
                (Ok(aa), Ok(ab)) => {
                    let va = aa.to_vec();
                    let vb = ab.to_vec();
                    va.len() == vb.len() && va.iter().zip(vb.iter()).all(|(x, y)| x.equal(y))
                }
                _ => false,
            },
            (Object(a), Object(b)) => match (a.get(), b.get()) {
                (Ok(oa), Ok(ob)) => {
                    let ea = oa.entries_snapshot();
                    let eb = ob.entries_snapshot();
                    ea.len() == eb.len()
                        && ea
                            .iter()
                            .zip(eb.iter())
                            .all(|((na, va), (nb, vb))| na == nb && va.equal(vb))
                }
                _ => false,
            },
            (Function(a), Function(b)) => Handle::ptr_eq(a, b),
            (Task(a), Task(b)) => Handle::ptr_eq(a, b),
            (Channel(a), Channel(b)) => Handle::ptr_eq(a, b),
            (File(a), File(b)) => Handle::ptr_eq(a, b),
            (BuiltinFn(a), BuiltinFn(b)) => a == b,
            _ if self.is_numeric() && other.is_numeric() => {
                match (self.is_float(), other.is_float()) {
                    (false, false) => self.as_i64() == other.as_i64(),
                    _ => self.as_f64() == other.as_f64(),
                }
            }
            _ => false,
        }
    }

    /// Total printing function used by `print`/string-interpolation
    /// (spec.md §6 "Value printing").
    pub fn to_display_string(&self) -> String {
        match self {
            Value::I8(n) => n.to_string(),
            Value::I16(n) => n.to_string(),
            Value::I32(n) => n.to_string(),
            Value::I64(n) => n.to_string(),
            Value::U8(n) => n.to_string(),
            Value::U16(n) => n.to_string(),
            Value::U32(n) => n.to_string(),
            Value::U64(n) => n.to_string(),
            Value::F32(n) => format_float(*n as f64),
            Value::F64(n) => format_float(*n),
            Value::Bool(b) => b.to_string(),
            Value::Rune(r) => char::from_u32(*r).map(|c| c.to_string()).unwrap_or_default(),
            Value::Null => "null".to_string(),
            Value::Type(t) => format!("{t:?}"),
            Value::Ptr { address, size_hint } => format!("<ptr {address:#x} size={size_hint}>"),
            Value::String(h) => h
                .get()
                .map(|s| s.as_str_lossy())
                .unwrap_or_else(|_| "<freed string>".to_string()),
            Value::Buffer(h) => match h.get() {
                Ok(b) => format!(
                    "<buffer {:p} length={} capacity={}>",
                    b as *const _,
                    b.length(),
                    b.capacity()
                ),
                Err(_) => "<freed buffer>".to_string(),
            },
            Value::Array(h) => match h.get() {
                Ok(a) => {
                    let items: Vec<String> = a.to_vec().iter().map(Value::to_display_string).collect();
                    format!("[{}]", items.join(", "))
                }
                Err(_) => "<freed array>".to_string(),
            },
            Value::Object(h) => match h.get() {
                Ok(o) => match o.type_name() {
                    Some(name) => format!("<object:{name}>"),
                    None => "<object>".to_string(),
                },
                Err(_) => "<freed object>".to_string(),
            },
            Value::Function(_) => "<function>".to_string(),
            Value::Task(_) => "<task>".to_string(),
            Value::Channel(_) => "<channel>".to_string(),
            Value::File(h) => match h.get() {
                Ok(f) if f.is_closed() => "<file (closed)>".to_string(),
                Ok(f) => format!("<file '{}' mode='{}'>", f.path, f.mode),
                Err(_) => "<file (closed)>".to_string(),
            },
            Value::BuiltinFn(_) => "<function>".to_string(),
        }
    }

    /// Debug-oriented representation for `tracing` events (SPEC_FULL.md
    /// §11 "`to_debug_string`"), independent of the user-visible printing
    /// contract above.
    pub fn to_debug_string(&self) -> String {
        format!("{self:?}")
    }
}

/// Structural equality used by `assert_eq!`/`Vec::contains` in tests and by
/// exact-tag comparisons in collection methods. Distinct from `equal()`,
/// which additionally promotes across numeric tags per spec.md §4.1 —
/// `PartialEq` here requires matching tags, `equal()` is the
/// language-level comparison operator.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (I8(a), I8(b)) => a == b,
            (I16(a), I16(b)) => a == b,
            (I32(a), I32(b)) => a == b,
            (I64(a), I64(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (F32(a), F32(b)) => a == b,
            (F64(a), F64(b)) => a == b,
            (Bool(a), Bool(b)) => a == b,
            (Rune(a), Rune(b)) => a == b,
            (Null, Null) => true,
            (Type(a), Type(b)) => a == b,
            (Ptr { address: a, .. }, Ptr { address: b, .. }) => a == b,
            (String(a), String(b)) => match (a.get(), b.get()) {
                (Ok(sa), Ok(sb)) => sa.as_bytes() == sb.as_bytes(),
                _ => Handle::ptr_eq(a, b),
            },
            (Buffer(a), Buffer(b)) => Handle::ptr_eq(a, b),
            (Array(a), Array(b)) => Handle::ptr_eq(a, b),
            (Object(a), Object(b)) => Handle::ptr_eq(a, b),
            (Function(a), Function(b)) => Handle::ptr_eq(a, b),
            (Task(a), Task(b)) => Handle::ptr_eq(a, b),
            (Channel(a), Channel(b)) => Handle::ptr_eq(a, b),
            (File(a), File(b)) => Handle::ptr_eq(a, b),
            (BuiltinFn(a), BuiltinFn(b)) => a == b,
            _ => false,
        }
    }
}

/// Floats print as the shortest round-trip decimal (spec.md §6); Rust's
/// default `f64` `Display` already guarantees round-trip shortest form.
fn format_float(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.1}")
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec_zero_values() {
        assert!(!Value::Null.truthiness());
        assert!(!Value::Bool(false).truthiness());
        assert!(!Value::I64(0).truthiness());
        assert!(!Value::string("").truthiness());
        assert!(Value::string("x").truthiness());
        assert!(!Value::new_array(vec![]).truthiness());
        assert!(Value::new_array(vec![Value::I64(1)]).truthiness());
    }

    #[test]
    fn equal_is_byte_wise_for_strings() {
        let a = Value::string("hi");
        let b = Value::string("hi");
        assert!(a.equal(&b));
    }

    #[test]
    fn equal_is_pointer_identity_for_functions_and_tasks() {
        let t1 = Value::Task(Handle::new(TaskObj::new()));
        let t2 = Value::Task(Handle::new(TaskObj::new()));
        let t1_alias = t1.clone();
        assert!(t1.equal(&t1_alias));
        assert!(!t1.equal(&t2));
    }

    #[test]
    fn equal_promotes_across_numeric_tags() {
        assert!(Value::I32(3).equal(&Value::I64(3)));
        assert!(Value::I64(3).equal(&Value::F64(3.0)));
        assert!(!Value::I64(3).equal(&Value::Bool(true)));
    }

    #[test]
    fn display_formats_integers_floats_and_arrays() {
        assert_eq!(Value::I64(14).to_display_string(), "14");
        assert_eq!(Value::F64(2.0).to_display_string(), "2.0");
        let arr = Value::new_array(vec![Value::I64(2), Value::I64(3)]);
        assert_eq!(arr.to_display_string(), "[2, 3]");
    }

    #[test]
    fn object_display_uses_type_name_when_present() {
        let obj = ObjectObj::new(Some("Point".to_string()));
        let v = Value::new_object(obj);
        assert_eq!(v.to_display_string(), "<object:Point>");
        let anon = Value::new_object(ObjectObj::new(None));
        assert_eq!(anon.to_display_string(), "<object>");
    }
}
