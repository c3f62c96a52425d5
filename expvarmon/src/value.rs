//! Canonical scalar values and the JSON-to-scalar normalizer.

use std::cmp::Ordering;
use std::fmt;

/// A normalized debug variable value. "Absent" is expressed as `Option<Value>::None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Numeric view of the value; `None` for booleans and strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Bool(_) | Value::Str(_) => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// Projection used for sparklines. Floats truncate, booleans map to 0/1, strings to 0.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Int(v) => *v,
            Value::Float(v) => *v as i64,
            Value::Bool(b) => i64::from(*b),
            Value::Str(_) => 0,
        }
    }

    /// Numeric ordering across Int and Float; `None` if either side is not a number.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64()?.partial_cmp(&other.as_f64()?),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:.2}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
        }
    }
}

/// Normalize one raw JSON value into a canonical scalar.
///
/// Interpretations are tried in a fixed order and the first that fits wins:
/// 64-bit integer, 64-bit float, boolean, string, array. Arrays collapse to the
/// mean of their numeric elements (non-numeric elements are skipped); the mean
/// is truncated to an integer when the first element is an integer. An empty
/// array is `Int(0)`, and an array without any numeric element yields `None`,
/// as do objects and `null`.
pub fn guess_value(raw: &serde_json::Value) -> Option<Value> {
    if let Some(v) = raw.as_i64() {
        return Some(Value::Int(v));
    }
    if let Some(v) = raw.as_f64() {
        return Some(Value::Float(v));
    }
    if let Some(v) = raw.as_bool() {
        return Some(Value::Bool(v));
    }
    if let Some(v) = raw.as_str() {
        return Some(Value::Str(v.to_string()));
    }
    if let Some(items) = raw.as_array() {
        return average(items);
    }
    None
}

// Only the numeric trials apply to array elements.
fn numeric(raw: &serde_json::Value) -> Option<Value> {
    if let Some(v) = raw.as_i64() {
        Some(Value::Int(v))
    } else {
        raw.as_f64().map(Value::Float)
    }
}

fn average(items: &[serde_json::Value]) -> Option<Value> {
    let Some(first) = items.first() else {
        return Some(Value::Int(0));
    };

    let (sum, count) = items
        .iter()
        .filter_map(|item| numeric(item)?.as_f64())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        return None;
    }
    let avg = sum / count as f64;

    match numeric(first) {
        Some(Value::Int(_)) => Some(Value::Int(avg as i64)),
        _ => Some(Value::Float(avg)),
    }
}
