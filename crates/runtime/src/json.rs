//! JSON serialization for the `serialize`/`deserialize` builtins
//! (spec.md §6 "Serialization").
//!
//! Uses `serde_json::Value` purely as an intermediate representation —
//! Hemlock's own `Value` never derives `Serialize`/`Deserialize` since its
//! heap variants are hand-rolled `Handle<T>`s, not serde-shaped data.
//! Gated behind the `report-json` feature.

#![cfg(feature = "report-json")]

use hemlock_core::error::RuntimeError;

use crate::heap::ObjectObj;
use crate::value::Value;

/// Converts a Hemlock value to a JSON string. Functions, tasks, channels,
/// files and raw pointers have no JSON shape and are rejected. Cyclic
/// arrays/objects would recurse forever, so depth is bounded instead of
/// chased with a visited-set — spec.md doesn't require cycle *detection*,
/// only that serialization terminates for acyclic data.
pub fn serialize(value: &Value) -> Result<String, RuntimeError> {
    let j = to_json(value, 0)?;
    serde_json::to_string(&j).map_err(|e| RuntimeError::parse(format!("serialize failed: {e}")))
}

const MAX_DEPTH: usize = 64;

fn to_json(value: &Value, depth: usize) -> Result<serde_json::Value, RuntimeError> {
    if depth > MAX_DEPTH {
        return Err(RuntimeError::type_error("value nested too deeply to serialize"));
    }
    use serde_json::Value as J;
    Ok(match value {
        Value::Null => J::Null,
        Value::Bool(b) => J::Bool(*b),
        Value::I8(n) => J::Number((*n).into()),
        Value::I16(n) => J::Number((*n).into()),
        Value::I32(n) => J::Number((*n).into()),
        Value::I64(n) => J::Number((*n).into()),
        Value::U8(n) => J::Number((*n).into()),
        Value::U16(n) => J::Number((*n).into()),
        Value::U32(n) => J::Number((*n).into()),
        Value::U64(n) => J::Number((*n).into()),
        Value::F32(n) => serde_json::Number::from_f64(*n as f64).map(J::Number).unwrap_or(J::Null),
        Value::F64(n) => serde_json::Number::from_f64(*n).map(J::Number).unwrap_or(J::Null),
        Value::Rune(r) => J::String(char::from_u32(*r).map(|c| c.to_string()).unwrap_or_default()),
        Value::String(h) => J::String(h.get()?.as_str_lossy()),
        Value::Array(h) => {
            let arr = h.get()?;
            let mut out = Vec::with_capacity(arr.length());
            for item in arr.to_vec() {
                out.push(to_json(&item, depth + 1)?);
            }
            J::Array(out)
        }
        Value::Object(h) => {
            let obj = h.get()?;
            let mut map = serde_json::Map::new();
            for (k, v) in obj.entries_snapshot() {
                map.insert(k, to_json(&v, depth + 1)?);
            }
            J::Object(map)
        }
        other => return Err(RuntimeError::type_error(format!("{:?} has no JSON representation", other.tag()))),
    })
}

/// Parses a JSON string into a Hemlock value. JSON numbers land as `F64`
/// unless they parse exactly as an `i64`, matching spec.md §6's "integers
/// without a fractional part or exponent deserialize as Int64".
pub fn deserialize(text: &str) -> Result<Value, RuntimeError> {
    let j: serde_json::Value = serde_json::from_str(text).map_err(|e| RuntimeError::parse(format!("malformed JSON: {e}")))?;
    from_json(&j)
}

fn from_json(j: &serde_json::Value) -> Result<Value, RuntimeError> {
    use serde_json::Value as J;
    Ok(match j {
        J::Null => Value::Null,
        J::Bool(b) => Value::Bool(*b),
        J::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::I64(i)
            } else if let Some(f) = n.as_f64() {
                Value::F64(f)
            } else {
                return Err(RuntimeError::parse("JSON number out of range"));
            }
        }
        J::String(s) => Value::string(s.clone()),
        J::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(from_json(item)?);
            }
            Value::new_array(out)
        }
        J::Object(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (k, v) in map {
                entries.push((k.clone(), from_json(v)?));
            }
            Value::new_object(ObjectObj::from_entries(None, entries))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_object() {
        let obj = ObjectObj::from_entries(None, vec![("a".to_string(), Value::I64(1)), ("b".to_string(), Value::Bool(true))]);
        let v = Value::new_object(obj);
        let s = serialize(&v).unwrap();
        let back = deserialize(&s).unwrap();
        match back {
            Value::Object(h) => {
                let o = h.get().unwrap();
                assert_eq!(o.get("a"), Some(Value::I64(1)));
                assert_eq!(o.get("b"), Some(Value::Bool(true)));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn integers_round_trip_as_int64() {
        let s = serialize(&Value::I64(42)).unwrap();
        assert_eq!(s, "42");
        assert_eq!(deserialize(&s).unwrap(), Value::I64(42));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = deserialize("{not json").unwrap_err();
        assert_eq!(err.kind, hemlock_core::error::ErrorKind::ParseOrDeserialize);
    }

    #[test]
    fn function_has_no_json_representation() {
        assert!(to_json(&Value::Null, MAX_DEPTH + 1).is_err());
    }
}
