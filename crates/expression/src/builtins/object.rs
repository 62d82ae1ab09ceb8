//! Object manipulation functions

use serde_json::Value;

use super::{get_object_arg, get_string_arg};
use crate::context::EvaluationContext;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::eval::Evaluator;
use crate::memory::Memory;
use crate::memory::path::lookup;
use crate::value_utils::{to_text, value_type_name};

/// Copy of the object with a new property; fails if it already exists
pub fn add_property(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let mut object = get_object_arg("addProperty", args, 0, "object")?.clone();
    let name = get_string_arg("addProperty", args, 1, "property")?;
    if object.contains_key(name) {
        return Err(ExpressionError::invalid_argument(
            "addProperty",
            format!("{} already exists", name),
        ));
    }
    object.insert(name.to_string(), args[2].clone());
    Ok(Value::Object(object))
}

/// Copy of the object with a property set or replaced
pub fn set_property(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let mut object = get_object_arg("setProperty", args, 0, "object")?.clone();
    let name = get_string_arg("setProperty", args, 1, "property")?;
    object.insert(name.to_string(), args[2].clone());
    Ok(Value::Object(object))
}

/// Copy of the object without a property
pub fn remove_property(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let mut object = get_object_arg("removeProperty", args, 0, "object")?.clone();
    let name = get_string_arg("removeProperty", args, 1, "property")?;
    object.shift_remove(name);
    Ok(Value::Object(object))
}

/// First argument that is not null
pub fn coalesce(args: &[Value], _ctx: &EvaluationContext) -> ExpressionResult<Value> {
    Ok(args
        .iter()
        .find(|v| !v.is_null())
        .cloned()
        .unwrap_or(Value::Null))
}

/// `getProperty(object, name)` reads a property of a value,
/// `getProperty(name)` reads a top-level name from memory.
pub fn get_property(args: &[Expr], evaluator: &Evaluator<'_>, memory: &mut dyn Memory) -> ExpressionResult<Value> {
    if let [name] = args {
        let name = evaluator.eval(name, memory)?;
        let Value::String(name) = name else {
            return Err(ExpressionError::invalid_argument(
                "getProperty",
                format!("property name must be a string, got {}", value_type_name(&name)),
            ));
        };
        return Ok(memory.get_value(&name).unwrap_or(Value::Null));
    }

    let instance = evaluator.eval(&args[0], memory)?;
    let name = to_text(&evaluator.eval(&args[1], memory)?);
    let value = match &instance {
        Value::Null => None,
        Value::Object(map) => lookup(map, &name, true),
        other => {
            return Err(ExpressionError::invalid_argument(
                "getProperty",
                format!("expected an object, got {}", value_type_name(other)),
            ));
        }
    };
    Ok(value.cloned().unwrap_or(Value::Null))
}
