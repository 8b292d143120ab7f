// src/expression.rs
use crate::errors::{ExprError, Result};
use crate::functions::ExprFunction;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// A parsed layout expression: a scalar literal or a function call.
///
/// Accepted JSON encodings:
/// - `["equals", ["component", "age"], 18]`
/// - `{"equals": [{"component": "age"}, 18]}` (a non-array value is a single argument)
/// - `{"function": "equals", "args": [...]}`
///
/// Function names and argument counts are checked while parsing, so a
/// successfully parsed tree only contains well-formed calls.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutExpression {
    Literal(Value),
    Call {
        function: ExprFunction,
        args: Vec<LayoutExpression>,
    },
}

impl LayoutExpression {
    pub fn parse(input: &Value) -> Result<Self> {
        match input {
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                Ok(LayoutExpression::Literal(input.clone()))
            }
            Value::Array(items) => {
                let (head, rest) = items
                    .split_first()
                    .ok_or_else(|| ExprError::InvalidExpression("empty array".into()))?;
                let name = head.as_str().ok_or_else(|| {
                    ExprError::InvalidExpression(format!(
                        "function name must be a string, got {head}"
                    ))
                })?;
                Self::call_from(name, rest)
            }
            Value::Object(map) => Self::parse_object(map),
        }
    }

    fn parse_object(map: &Map<String, Value>) -> Result<Self> {
        if let Some(name) = map.get("function") {
            let extra = map.keys().any(|k| k != "function" && k != "args");
            let name = name.as_str().filter(|_| !extra).ok_or_else(|| {
                ExprError::InvalidExpression(format!("malformed function object {}", Value::Object(map.clone())))
            })?;
            return match map.get("args") {
                None => Self::call_from(name, &[]),
                Some(Value::Array(args)) => Self::call_from(name, args),
                Some(other) => Err(ExprError::InvalidExpression(format!(
                    "\"args\" must be an array, got {other}"
                ))),
            };
        }
        let mut entries = map.iter();
        match (entries.next(), entries.next()) {
            (Some((name, Value::Array(args))), None) => Self::call_from(name, args),
            (Some((name, arg)), None) => Self::call_from(name, std::slice::from_ref(arg)),
            _ => Err(ExprError::InvalidExpression(format!(
                "object expressions must have exactly one key, got {}",
                map.len()
            ))),
        }
    }

    fn call_from(name: &str, raw_args: &[Value]) -> Result<Self> {
        let function = ExprFunction::from_name(name)
            .ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;
        let args = raw_args
            .iter()
            .map(Self::parse)
            .collect::<Result<Vec<_>>>()?;
        Self::call(function, args)
    }

    /// Build a call, checking the argument list.
    pub fn call(function: ExprFunction, args: Vec<LayoutExpression>) -> Result<Self> {
        function.validate(&args)?;
        Ok(LayoutExpression::Call { function, args })
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        LayoutExpression::Literal(value.into())
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, LayoutExpression::Literal(_))
    }

    /// Canonical (array form) JSON encoding.
    pub fn to_json(&self) -> Value {
        match self {
            LayoutExpression::Literal(v) => v.clone(),
            LayoutExpression::Call { function, args } => {
                let mut out = Vec::with_capacity(args.len() + 1);
                out.push(Value::String(function.name().to_string()));
                out.extend(args.iter().map(LayoutExpression::to_json));
                Value::Array(out)
            }
        }
    }
}

impl TryFrom<&Value> for LayoutExpression {
    type Error = ExprError;

    fn try_from(value: &Value) -> Result<Self> {
        LayoutExpression::parse(value)
    }
}

impl Serialize for LayoutExpression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LayoutExpression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        LayoutExpression::parse(&raw).map_err(D::Error::custom)
    }
}
