//! Logical and comparison functions
//!
//! All of these are lazy. An operand that fails to evaluate counts as
//! `false` rather than failing the whole expression, so `one / 0 || two`
//! is `true` and `notThere > 4` is `false`.

use std::cmp::Ordering;

use serde_json::Value;
use tracing::trace;

use crate::core::ast::Expr;
use crate::core::error::ExpressionResult;
use crate::eval::Evaluator;
use crate::memory::Memory;
use crate::value_utils::{is_truthy, values_equal};

/// Evaluate an operand, turning an error into `None`
pub(crate) fn eval_or_none(
    expr: &Expr,
    evaluator: &Evaluator<'_>,
    memory: &mut dyn Memory,
) -> Option<Value> {
    match evaluator.eval(expr, memory) {
        Ok(value) => Some(value),
        Err(error) => {
            trace!(operand = %expr, %error, "Operand error treated as false");
            None
        }
    }
}

/// Truthiness of an operand; errors are falsy
pub(crate) fn eval_truthy(expr: &Expr, evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> bool {
    eval_or_none(expr, evaluator, memory).is_some_and(|v| is_truthy(&v))
}

/// True when every operand is truthy; stops at the first that is not
pub fn and(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    for arg in args {
        if !eval_truthy(arg, evaluator, memory) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// True when any operand is truthy; stops at the first that is
pub fn or(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    for arg in args {
        if eval_truthy(arg, evaluator, memory) {
            return Ok(Value::Bool(true));
        }
    }
    Ok(Value::Bool(false))
}

/// Logical negation
pub fn not(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    Ok(Value::Bool(!eval_truthy(&args[0], evaluator, memory)))
}

/// Evaluate only the branch the condition selects
pub fn if_(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    let branch = if eval_truthy(&args[0], evaluator, memory) {
        &args[1]
    } else {
        &args[2]
    };
    evaluator.eval(branch, memory)
}

fn both(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> Option<(Value, Value)> {
    let left = eval_or_none(&args[0], evaluator, memory)?;
    let right = eval_or_none(&args[1], evaluator, memory)?;
    Some((left, right))
}

/// Deep equality; numbers compare by value, `null == null`
pub fn equals(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    let equal = both(args, evaluator, memory).is_some_and(|(l, r)| values_equal(&l, &r));
    Ok(Value::Bool(equal))
}

/// Negated `equals`; false when an operand fails
pub fn not_equals(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    let different = both(args, evaluator, memory).is_some_and(|(l, r)| !values_equal(&l, &r));
    Ok(Value::Bool(different))
}

/// Ordering between two numbers or two strings; anything else is not comparable
fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => Some(l.cmp(&r)),
            _ => l.as_f64()?.partial_cmp(&r.as_f64()?),
        },
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

fn compare(
    args: &[Expr],
    evaluator: &Evaluator<'_>,
    memory: &mut dyn Memory,
    accept: fn(Ordering) -> bool,
) -> ExpressionResult<Value> {
    let result = both(args, evaluator, memory)
        .and_then(|(l, r)| ordering(&l, &r))
        .is_some_and(accept);
    Ok(Value::Bool(result))
}

/// `a > b`
pub fn greater(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    compare(args, evaluator, memory, Ordering::is_gt)
}

/// `a >= b`
pub fn greater_or_equals(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    compare(args, evaluator, memory, Ordering::is_ge)
}

/// `a < b`
pub fn less(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    compare(args, evaluator, memory, Ordering::is_lt)
}

/// `a <= b`
pub fn less_or_equals(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    compare(args, evaluator, memory, Ordering::is_le)
}

/// True when the operand evaluates to something other than null
pub fn exists(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    let found = eval_or_none(&args[0], evaluator, memory).is_some_and(|v| !v.is_null());
    Ok(Value::Bool(found))
}

#[cfg(test)]
mod tests {
    use crate::expression::Expression;
    use crate::memory::SimpleObjectMemory;
    use serde_json::{Value, json};

    fn eval(source: &str) -> Value {
        let mut memory = SimpleObjectMemory::new(json!({
            "one": 1.0,
            "two": 2.0,
            "hello": "hello",
            "nullObj": null,
            "bag": {"name": "mybag"}
        }));
        Expression::parse(source).unwrap().try_evaluate(&mut memory).unwrap()
    }

    #[test]
    fn test_short_circuit() {
        assert_eq!(eval("and(1 == 1, 1 < 2, 1 > 2)"), json!(false));
        assert_eq!(eval("or(hello * 5, two)"), json!(true));
        assert_eq!(eval("one / 0 || two"), json!(true));
        assert_eq!(eval("false && (hello * 5)"), json!(false));
    }

    #[test]
    fn test_errors_are_false() {
        assert_eq!(eval("not(hello * 5)"), json!(true));
        assert_eq!(eval("if(hello * 5, 'r1', 'r2')"), json!("r2"));
        assert_eq!(eval("notThere > 4"), json!(false));
        assert_eq!(eval("equals(hello * 5, hello * 5)"), json!(false));
    }

    #[test]
    fn test_zero_is_truthy() {
        assert_eq!(eval("if(0, 'r1', 'r2')"), json!("r1"));
        assert_eq!(eval("0 || false"), json!(true));
        assert_eq!(eval("!(0)"), json!(false));
    }

    #[test]
    fn test_null_equality() {
        assert_eq!(eval("nullObj == null"), json!(true));
        assert_eq!(eval("bag.name == null"), json!(false));
        assert_eq!(eval("nullObj != null"), json!(false));
    }

    #[test]
    fn test_ordering_across_number_kinds() {
        assert_eq!(eval("one >= 1"), json!(true));
        assert_eq!(eval("less(one, two)"), json!(true));
        assert_eq!(eval("'abc' < 'abd'"), json!(true));
        assert_eq!(eval("'1' < 2"), json!(false));
    }

    #[test]
    fn test_exists() {
        assert_eq!(eval("exists(one)"), json!(true));
        assert_eq!(eval("exists(one.xxx)"), json!(false));
        assert_eq!(eval("exists(nullObj)"), json!(false));
    }
}
