//! Utility functions for working with serde_json::Value

use serde_json::{Number, Value};

use crate::error::{ExpressionError, ExpressionResult};

/// Get the type name of a Value for error messages
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if is_integer_number(n) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Extract i64 from Number, trying both i64 and f64 representations
#[inline]
pub fn number_as_i64(num: &Number) -> Option<i64> {
    num.as_i64().or_else(|| num.as_f64().map(|f| f as i64))
}

/// Extract f64 from Number, trying both f64 and i64 representations
#[inline]
pub fn number_as_f64(num: &Number) -> Option<f64> {
    num.as_f64().or_else(|| num.as_i64().map(|i| i as f64))
}

/// Check if a number represents an integer
#[inline]
pub fn is_integer_number(num: &Number) -> bool {
    num.is_i64() || num.is_u64()
}

/// Check if a value is an integer number
#[inline]
pub fn is_integer(value: &Value) -> bool {
    matches!(value, Value::Number(n) if is_integer_number(n))
}

/// Wrap an f64, mapping non-finite results to null
#[inline]
pub fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Float result of `function`; infinity and NaN are argument errors.
pub fn finite_value(function: &str, f: f64) -> ExpressionResult<Value> {
    Number::from_f64(f).map(Value::Number).ok_or_else(|| {
        ExpressionError::invalid_argument(function, "result is not a finite number")
    })
}

/// Only `null` and `false` are falsy; `0`, `''` and empty collections are truthy.
pub fn is_truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Convert Value to i64 with error
pub fn to_integer(value: &Value) -> Result<i64, &'static str> {
    match value {
        Value::Number(n) => number_as_i64(n).ok_or("number is not an integer"),
        Value::String(s) => s.trim().parse().map_err(|_| "string is not a valid integer"),
        _ => Err("value cannot be converted to integer"),
    }
}

/// Convert Value to f64 with error
pub fn to_float(value: &Value) -> Result<f64, &'static str> {
    match value {
        Value::Number(n) => number_as_f64(n).ok_or("number cannot be represented as float"),
        Value::String(s) => s.trim().parse().map_err(|_| "string is not a valid number"),
        _ => Err("value cannot be converted to number"),
    }
}

/// Text form of a value: strings raw, null empty, everything else as JSON.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
                l == r
            } else {
                number_as_f64(l) == number_as_f64(r)
            }
        }
        (Value::Array(l), Value::Array(r)) => {
            l.len() == r.len() && l.iter().zip(r).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(l), Value::Object(r)) => {
            l.len() == r.len()
                && l
                    .iter()
                    .all(|(k, v)| r.get(k).is_some_and(|other| values_equal(v, other)))
        }
        _ => left == right,
    }
}

/// Ordering used by sorting functions: numbers, then strings, by value.
pub fn compare_values(left: &Value, right: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => {
            if let (Some(l), Some(r)) = (l.as_i64(), r.as_i64()) {
                l.cmp(&r)
            } else {
                number_as_f64(l)
                    .partial_cmp(&number_as_f64(r))
                    .unwrap_or(Ordering::Equal)
            }
        }
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => to_text(left).cmp(&to_text(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_type_name() {
        assert_eq!(value_type_name(&Value::Null), "null");
        assert_eq!(value_type_name(&Value::Bool(true)), "boolean");
        assert_eq!(value_type_name(&json!(42)), "integer");
        assert_eq!(value_type_name(&json!(4.2)), "number");
        assert_eq!(value_type_name(&json!("test")), "string");
        assert_eq!(value_type_name(&json!([])), "array");
        assert_eq!(value_type_name(&json!({})), "object");
    }

    #[test]
    fn test_is_truthy() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&Value::Bool(false)));
        assert!(is_truthy(&Value::Bool(true)));
        assert!(is_truthy(&json!(0)));
        assert!(is_truthy(&json!("")));
        assert!(is_truthy(&json!("false")));
        assert!(is_truthy(&json!([])));
    }

    #[test]
    fn test_values_equal_across_number_kinds() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(&json!("raw")), "raw");
        assert_eq!(to_text(&Value::Null), "");
        assert_eq!(to_text(&json!(1.0)), "1.0");
        assert_eq!(to_text(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
