//! The closed set of functions a layout expression can call.

use crate::cast::{as_boolean, as_number, as_string, number_value};
use crate::comparison::cmp_numbers;
use crate::context::ExprContext;
use crate::engine::evaluate;
use crate::errors::{ExprError, Result};
use crate::expression::LayoutExpression;
use itertools::Itertools;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    OneOf(&'static [usize]),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exactly(k) => n == *k,
            Arity::AtLeast(k) => n >= *k,
            Arity::OneOf(ks) => ks.contains(&n),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(k) => write!(f, "{k}"),
            Arity::AtLeast(k) => write!(f, "at least {k}"),
            Arity::OneOf(ks) => write!(f, "{}", ks.iter().join(" or ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprFunction {
    Equals,
    NotEquals,
    Not,
    GreaterThan,
    GreaterThanEq,
    LessThan,
    LessThanEq,
    Concat,
    And,
    Or,
    If,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    StringLength,
    LowerCase,
    UpperCase,
    Round,
    Component,
    DataModel,
    InstanceContext,
    FrontendSettings,
    RowIndex,
}

impl ExprFunction {
    pub const ALL: [ExprFunction; 24] = [
        ExprFunction::Equals,
        ExprFunction::NotEquals,
        ExprFunction::Not,
        ExprFunction::GreaterThan,
        ExprFunction::GreaterThanEq,
        ExprFunction::LessThan,
        ExprFunction::LessThanEq,
        ExprFunction::Concat,
        ExprFunction::And,
        ExprFunction::Or,
        ExprFunction::If,
        ExprFunction::Contains,
        ExprFunction::NotContains,
        ExprFunction::StartsWith,
        ExprFunction::EndsWith,
        ExprFunction::StringLength,
        ExprFunction::LowerCase,
        ExprFunction::UpperCase,
        ExprFunction::Round,
        ExprFunction::Component,
        ExprFunction::DataModel,
        ExprFunction::InstanceContext,
        ExprFunction::FrontendSettings,
        ExprFunction::RowIndex,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExprFunction::Equals => "equals",
            ExprFunction::NotEquals => "notEquals",
            ExprFunction::Not => "not",
            ExprFunction::GreaterThan => "greaterThan",
            ExprFunction::GreaterThanEq => "greaterThanEq",
            ExprFunction::LessThan => "lessThan",
            ExprFunction::LessThanEq => "lessThanEq",
            ExprFunction::Concat => "concat",
            ExprFunction::And => "and",
            ExprFunction::Or => "or",
            ExprFunction::If => "if",
            ExprFunction::Contains => "contains",
            ExprFunction::NotContains => "notContains",
            ExprFunction::StartsWith => "startsWith",
            ExprFunction::EndsWith => "endsWith",
            ExprFunction::StringLength => "stringLength",
            ExprFunction::LowerCase => "lowerCase",
            ExprFunction::UpperCase => "upperCase",
            ExprFunction::Round => "round",
            ExprFunction::Component => "component",
            ExprFunction::DataModel => "dataModel",
            ExprFunction::InstanceContext => "instanceContext",
            ExprFunction::FrontendSettings => "frontendSettings",
            ExprFunction::RowIndex => "rowIndex",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    pub fn arity(self) -> Arity {
        match self {
            ExprFunction::Not
            | ExprFunction::StringLength
            | ExprFunction::LowerCase
            | ExprFunction::UpperCase
            | ExprFunction::Component
            | ExprFunction::DataModel
            | ExprFunction::InstanceContext
            | ExprFunction::FrontendSettings => Arity::Exactly(1),
            ExprFunction::Equals
            | ExprFunction::NotEquals
            | ExprFunction::GreaterThan
            | ExprFunction::GreaterThanEq
            | ExprFunction::LessThan
            | ExprFunction::LessThanEq
            | ExprFunction::Contains
            | ExprFunction::NotContains
            | ExprFunction::StartsWith
            | ExprFunction::EndsWith => Arity::Exactly(2),
            ExprFunction::RowIndex => Arity::Exactly(0),
            ExprFunction::Concat => Arity::AtLeast(0),
            ExprFunction::And | ExprFunction::Or => Arity::AtLeast(1),
            ExprFunction::If => Arity::OneOf(&[2, 4]),
            ExprFunction::Round => Arity::OneOf(&[1, 2]),
        }
    }

    /// Check an argument list before the call is built.
    pub fn validate(self, args: &[LayoutExpression]) -> Result<()> {
        let arity = self.arity();
        if !arity.accepts(args.len()) {
            return Err(ExprError::Arity {
                function: self.name().to_string(),
                expected: arity.to_string(),
                actual: args.len(),
            });
        }
        if self == ExprFunction::If && args.len() == 4 {
            let is_else = matches!(&args[2], LayoutExpression::Literal(Value::String(s)) if s == "else");
            if !is_else {
                return Err(ExprError::InvalidExpression(
                    "expected literal \"else\" as the third argument to \"if\"".into(),
                ));
            }
        }
        Ok(())
    }

    /// Apply the function. Arguments are evaluated left to right; `and`, `or`
    /// and `if` stop as soon as the result is known, all others are eager.
    pub fn call(self, args: &[LayoutExpression], ctx: &ExprContext<'_>) -> Result<Value> {
        tracing::trace!(function = self.name(), args = args.len(), "dispatch");
        let arg = |i: usize| evaluate(&args[i], ctx);
        let value = match self {
            ExprFunction::Equals => Value::Bool(as_string(&arg(0)?)? == as_string(&arg(1)?)?),
            ExprFunction::NotEquals => Value::Bool(as_string(&arg(0)?)? != as_string(&arg(1)?)?),
            ExprFunction::Not => Value::Bool(!as_boolean(&arg(0)?)?),
            ExprFunction::GreaterThan => compare(&arg(0)?, &arg(1)?, Ordering::is_gt)?,
            ExprFunction::GreaterThanEq => compare(&arg(0)?, &arg(1)?, Ordering::is_ge)?,
            ExprFunction::LessThan => compare(&arg(0)?, &arg(1)?, Ordering::is_lt)?,
            ExprFunction::LessThanEq => compare(&arg(0)?, &arg(1)?, Ordering::is_le)?,
            ExprFunction::Concat => {
                let joined = itertools::process_results(
                    args.iter().map(|a| {
                        let v = evaluate(a, ctx)?;
                        Ok::<_, ExprError>(as_string(&v)?.unwrap_or_default())
                    }),
                    |parts| parts.collect::<String>(),
                )?;
                Value::String(joined)
            }
            ExprFunction::And => {
                for a in args {
                    if !as_boolean(&evaluate(a, ctx)?)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Value::Bool(true)
            }
            ExprFunction::Or => {
                for a in args {
                    if as_boolean(&evaluate(a, ctx)?)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Value::Bool(false)
            }
            ExprFunction::If => {
                if as_boolean(&arg(0)?)? {
                    arg(1)?
                } else if args.len() == 4 {
                    arg(3)?
                } else {
                    Value::Null
                }
            }
            ExprFunction::Contains => {
                Value::Bool(strings(&arg(0)?, &arg(1)?, |a, b| a.contains(b))?)
            }
            ExprFunction::NotContains => {
                Value::Bool(!strings(&arg(0)?, &arg(1)?, |a, b| a.contains(b))?)
            }
            ExprFunction::StartsWith => {
                Value::Bool(strings(&arg(0)?, &arg(1)?, |a, b| a.starts_with(b))?)
            }
            ExprFunction::EndsWith => {
                Value::Bool(strings(&arg(0)?, &arg(1)?, |a, b| a.ends_with(b))?)
            }
            ExprFunction::StringLength => {
                let len = as_string(&arg(0)?)?.map_or(0, |s| s.chars().count());
                Value::from(len)
            }
            ExprFunction::LowerCase => as_string(&arg(0)?)?
                .map_or(Value::Null, |s| Value::String(s.to_lowercase())),
            ExprFunction::UpperCase => as_string(&arg(0)?)?
                .map_or(Value::Null, |s| Value::String(s.to_uppercase())),
            ExprFunction::Round => {
                let number = as_number(&arg(0)?)?;
                let decimals = if args.len() == 2 {
                    decimal_places(&arg(1)?)?
                } else {
                    0
                };
                match number {
                    None => Value::Null,
                    Some(n) => {
                        let factor = 10f64.powi(decimals);
                        let scaled = n * factor;
                        // Past f64 precision there is nothing left to round.
                        if scaled.is_finite() {
                            number_value(scaled.round() / factor)?
                        } else {
                            number_value(n)?
                        }
                    }
                }
            }
            ExprFunction::Component => {
                let id = key_argument(self, &arg(0)?)?;
                ctx.component_value(&id)?
            }
            ExprFunction::DataModel => {
                let path = key_argument(self, &arg(0)?)?;
                ctx.data_model(&path)?
            }
            ExprFunction::InstanceContext => {
                let key = key_argument(self, &arg(0)?)?;
                ctx.instance_context(&key)?
            }
            ExprFunction::FrontendSettings => {
                let key = key_argument(self, &arg(0)?)?;
                ctx.frontend_setting(&key)
            }
            ExprFunction::RowIndex => Value::from(ctx.row_index()?),
        };
        Ok(value)
    }
}

impl fmt::Display for ExprFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn compare<F>(a: &Value, b: &Value, pred_on_ord: F) -> Result<Value>
where
    F: Fn(Ordering) -> bool,
{
    Ok(Value::Bool(cmp_numbers(as_number(a)?, as_number(b)?, pred_on_ord)))
}

/// String predicate where null on either side is false.
fn strings<F>(a: &Value, b: &Value, pred: F) -> Result<bool>
where
    F: Fn(&str, &str) -> bool,
{
    Ok(match (as_string(a)?, as_string(b)?) {
        (Some(a), Some(b)) => pred(&a, &b),
        _ => false,
    })
}

fn decimal_places(v: &Value) -> Result<i32> {
    match as_number(v)? {
        None => Ok(0),
        Some(d) if d >= 0.0 && d.fract() == 0.0 && d <= 15.0 => Ok(d as i32),
        Some(_) => Err(ExprError::Type {
            expected: "a whole number of decimals between 0 and 15",
            value: v.to_string(),
        }),
    }
}

/// Lookup functions need a non-null key to resolve.
fn key_argument(function: ExprFunction, v: &Value) -> Result<String> {
    as_string(v)?.ok_or_else(|| {
        ExprError::context(format!("{function}(null)"), "lookup key must not be null")
    })
}
