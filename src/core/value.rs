//! Helpers over `serde_json::Value`, the value type of every document field.

use serde_json::{Number, Value as JsonValue};
use std::cmp::Ordering;

/// Largest magnitude at which an `f64` still represents every integer exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Builds the JSON number for a coerced numeric input.
///
/// Integral values become integers so that `500` typed into a form equals the
/// `500` a schema declares. Non-finite input has no JSON form and becomes `0`.
pub fn number(value: f64) -> JsonValue {
    if !value.is_finite() {
        return JsonValue::from(0);
    }
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        return JsonValue::from(value as i64);
    }
    Number::from_f64(value)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::from(0))
}

/// Text form of a number: integral floats print without a trailing `.0`.
pub fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER => {
            format!("{}", f as i64)
        }
        _ => number.to_string(),
    }
}

/// Default string conversion of a value. Null renders as empty text, arrays as
/// their comma-joined elements, objects as JSON.
pub fn display(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => number_text(n),
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(", "),
        JsonValue::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

fn type_rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}

/// Ordering used for listings: absent values sort last, values of different
/// types are grouped by type, and same-typed scalars compare naturally.
pub fn compare(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (a, b) {
            (JsonValue::Bool(a), JsonValue::Bool(b)) => a.cmp(b),
            (JsonValue::Number(a), JsonValue::Number(b)) => {
                let a = a.as_f64().unwrap_or_default();
                let b = b.as_f64().unwrap_or_default();
                a.partial_cmp(&b).unwrap_or(Ordering::Equal)
            }
            (JsonValue::String(a), JsonValue::String(b)) => a.cmp(b),
            _ => type_rank(a).cmp(&type_rank(b)),
        },
    }
}
