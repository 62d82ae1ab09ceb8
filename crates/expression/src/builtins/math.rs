//! Math functions
//!
//! Integer operands keep integer arithmetic until an operation overflows or
//! a float operand joins in; then the result is a float.

use serde_json::Value;

use super::{get_array_arg, get_int_arg};
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::value_utils::{finite_value, number_as_f64, value_type_name};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_value(function: &str, value: &Value) -> ExpressionResult<Self> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Self::Int(i)),
                None => number_as_f64(n).map(Self::Float).ok_or_else(|| {
                    ExpressionError::invalid_argument(function, "number out of range")
                }),
            },
            other => Err(ExpressionError::invalid_argument(
                function,
                format!("expected a number, got {}", value_type_name(other)),
            )),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn into_value(self, function: &str) -> ExpressionResult<Value> {
        match self {
            Self::Int(i) => Ok(Value::from(i)),
            Self::Float(f) => finite_value(function, f),
        }
    }
}

fn numbers(function: &str, args: &[Value]) -> ExpressionResult<Vec<Num>> {
    args.iter().map(|v| Num::from_value(function, v)).collect()
}

/// Fold operands left to right with an integer op (None on overflow) and a float op
fn fold(
    function: &str,
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> ExpressionResult<Value> {
    let nums = numbers(function, args)?;
    let mut acc = nums[0];
    for &next in &nums[1..] {
        acc = match (acc, next) {
            (Num::Int(a), Num::Int(b)) => match int_op(a, b) {
                Some(r) => Num::Int(r),
                None => Num::Float(float_op(a as f64, b as f64)),
            },
            (a, b) => Num::Float(float_op(a.as_f64(), b.as_f64())),
        };
    }
    acc.into_value(function)
}

/// Sum of two or more numbers
pub fn add(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    fold("add", args, i64::checked_add, |a, b| a + b)
}

/// First number minus the rest
pub fn sub(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    fold("sub", args, i64::checked_sub, |a, b| a - b)
}

/// Product of two or more numbers
pub fn mul(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    fold("mul", args, i64::checked_mul, |a, b| a * b)
}

/// First number divided by the rest; integer division truncates
pub fn div(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let nums = numbers("div", args)?;
    if nums[1..].iter().any(|n| n.as_f64() == 0.0) {
        return Err(ExpressionError::division_by_zero());
    }
    fold("div", args, i64::checked_div, |a, b| a / b)
}

/// Remainder of integer or float division
pub fn modulo(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let nums = numbers("mod", args)?;
    if nums[1].as_f64() == 0.0 {
        return Err(ExpressionError::division_by_zero());
    }
    fold("mod", args, i64::checked_rem, |a, b| a % b)
}

/// Power; always a float
pub fn exp(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let nums = numbers("exp", args)?;
    finite_value("exp", nums[0].as_f64().powf(nums[1].as_f64()))
}

/// Operands of `max`/`min`: the arguments, or the items of a single list argument
fn candidates<'a>(function: &str, args: &'a [Value]) -> ExpressionResult<Vec<(Num, &'a Value)>> {
    let values: &[Value] = match args {
        [Value::Array(items)] => items,
        _ => args,
    };
    if values.is_empty() {
        return Err(ExpressionError::invalid_argument(function, "no values to compare"));
    }
    values
        .iter()
        .map(|v| Ok((Num::from_value(function, v)?, v)))
        .collect()
}

/// Largest operand, returned as given
pub fn max(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let values = candidates("max", args)?;
    let mut best = values[0];
    for &candidate in &values[1..] {
        if candidate.0.as_f64() > best.0.as_f64() {
            best = candidate;
        }
    }
    Ok(best.1.clone())
}

/// Smallest operand, returned as given
pub fn min(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let values = candidates("min", args)?;
    let mut best = values[0];
    for &candidate in &values[1..] {
        if candidate.0.as_f64() < best.0.as_f64() {
            best = candidate;
        }
    }
    Ok(best.1.clone())
}

/// Random integer in `min..max` drawn from the context's source
pub fn rand(args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let min = get_int_arg("rand", args, 0, "min")?;
    let max = get_int_arg("rand", args, 1, "max")?;
    if min >= max {
        return Err(ExpressionError::invalid_argument(
            "rand",
            format!("min value {} must be less than max value {}", min, max),
        ));
    }
    Ok(Value::from(ctx.random().next_in_range(min, max)))
}

/// Longest list `range` builds
pub const MAX_RANGE_COUNT: i64 = i32::MAX as i64;

/// `count` consecutive integers from `start`
pub fn range(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let start = get_int_arg("range", args, 0, "start")?;
    let count = get_int_arg("range", args, 1, "count")?;
    if count <= 0 {
        return Err(ExpressionError::invalid_argument(
            "range",
            format!("count must be positive, got {}", count),
        ));
    }
    if count > MAX_RANGE_COUNT {
        return Err(ExpressionError::invalid_argument(
            "range",
            format!("count {} exceeds the maximum of {}", count, MAX_RANGE_COUNT),
        ));
    }
    let end = start.checked_add(count).ok_or_else(|| {
        ExpressionError::invalid_argument("range", "range end overflows an integer")
    })?;
    Ok(Value::Array((start..end).map(Value::from).collect()))
}

/// Sum of a list of numbers; integer when every item is
pub fn sum(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let items = get_array_arg("sum", args, 0, "list")?;
    if items.is_empty() {
        return Ok(Value::from(0));
    }
    fold("sum", items, i64::checked_add, |a, b| a + b)
}

/// Mean of a list of numbers; always a float
pub fn average(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let items = get_array_arg("average", args, 0, "list")?;
    if items.is_empty() {
        return Err(ExpressionError::invalid_argument("average", "list is empty"));
    }
    let nums = numbers("average", items)?;
    let total: f64 = nums.iter().map(|n| n.as_f64()).sum();
    finite_value("average", total / nums.len() as f64)
}
