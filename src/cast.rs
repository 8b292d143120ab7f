//! Argument casting. Each function casts its arguments to the type it works
//! on before applying its logic; `None` stands for null.

use crate::errors::{ExprError, Result};
use serde_json::{Number, Value};

pub fn as_string(v: &Value) -> Result<Option<String>> {
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(number_to_string(n))),
        other => Err(type_error("string", other)),
    }
}

pub fn as_number(v: &Value) -> Result<Option<f64>> {
    match v {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| type_error("number", v)),
        Value::String(s) if is_numeric(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| type_error("number", v)),
        other => Err(type_error("number", other)),
    }
}

pub fn as_boolean(v: &Value) -> Result<bool> {
    match v {
        Value::Null => Ok(false),
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_f64() == Some(1.0) => Ok(true),
        Value::Number(n) if n.as_f64() == Some(0.0) => Ok(false),
        Value::String(s) => match s.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(type_error("boolean", v)),
        },
        other => Err(type_error("boolean", other)),
    }
}

/// Whole numbers print without a fractional part, so `18.0` and `18`
/// compare equal as strings.
pub fn number_to_string(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Build a JSON number, keeping integral results as integers. JSON has no
/// infinity or NaN, so those are type errors.
pub fn number_value(f: f64) -> Result<Value> {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return Ok(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number).ok_or(ExprError::Type {
        expected: "a finite number",
        value: f.to_string(),
    })
}

fn is_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int, frac) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    !int.is_empty()
        && int.chars().all(|c| c.is_ascii_digit())
        && frac.map_or(true, |f| !f.is_empty() && f.chars().all(|c| c.is_ascii_digit()))
}

fn type_error(expected: &'static str, v: &Value) -> ExprError {
    ExprError::Type {
        expected,
        value: v.to_string(),
    }
}
