//! Integer width enforcement, arithmetic promotion, and rune validation
//! (spec.md §4.1).
//!
//! This module works purely in terms of `i64`/`f64`/`u32` so it has no
//! dependency on the `Value` enum `hemlock-runtime` defines; the runtime
//! crate calls into this for the scalar rules and wraps the results back
//! into `Value` variants.

use crate::error::RuntimeError;

/// The eight fixed-width integer tags spec.md §3 lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// Inclusive range check, spec.md §4.1 "Numeric semantics" — values
    /// outside range for a sized integer type fail with a range error.
    pub fn check(self, value: i64) -> Result<i64, RuntimeError> {
        let in_range = match self {
            IntWidth::I8 => (i8::MIN as i64..=i8::MAX as i64).contains(&value),
            IntWidth::I16 => (i16::MIN as i64..=i16::MAX as i64).contains(&value),
            IntWidth::I32 => (i32::MIN as i64..=i32::MAX as i64).contains(&value),
            IntWidth::I64 => true,
            IntWidth::U8 => (0..=u8::MAX as i64).contains(&value),
            IntWidth::U16 => (0..=u16::MAX as i64).contains(&value),
            IntWidth::U32 => (0..=u32::MAX as i64).contains(&value),
            IntWidth::U64 => value >= 0,
        };
        if in_range {
            Ok(value)
        } else {
            Err(RuntimeError::range(format!(
                "value {value} out of range for {self:?}"
            )))
        }
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            IntWidth::U8 | IntWidth::U16 | IntWidth::U32 | IntWidth::U64
        )
    }
}

/// Rune (Unicode code point) range check: `[0, 0x10FFFF]` (spec.md §4.1).
pub fn check_rune(codepoint: u32) -> Result<u32, RuntimeError> {
    if codepoint <= 0x0010_FFFF {
        Ok(codepoint)
    } else {
        Err(RuntimeError::range(format!(
            "rune {codepoint:#x} outside Unicode range [0, 0x10FFFF]"
        )))
    }
}

/// Result of promoting two numeric operands for binary arithmetic: either
/// both integers (width is the wider of the two, signedness follows the
/// wider/left operand per spec.md's "promotes to the widest operand type"),
/// or the float lane once either side is a float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Promoted {
    Int(i64),
    Float(f64),
}

/// Integer division per spec.md §4.1: division by zero is an error (never
/// produces a sentinel). Modulo follows the sign of the dividend.
pub fn checked_int_div(a: i64, b: i64) -> Result<i64, RuntimeError> {
    if b == 0 {
        return Err(RuntimeError::type_error("integer division by zero"));
    }
    Ok(a.wrapping_div(b))
}

pub fn checked_int_rem(a: i64, b: i64) -> Result<i64, RuntimeError> {
    if b == 0 {
        return Err(RuntimeError::type_error("integer modulo by zero"));
    }
    // Rust's `%` already follows the dividend's sign, matching the spec.
    Ok(a.wrapping_rem(b))
}

/// Float division per spec.md §4.1: division by zero is an error, not
/// NaN/Inf — a deliberate deviation from IEEE 754 default behavior.
pub fn checked_float_div(a: f64, b: f64) -> Result<f64, RuntimeError> {
    if b == 0.0 {
        return Err(RuntimeError::type_error("float division by zero"));
    }
    Ok(a / b)
}
