//! Functions that write back into memory

use serde_json::Value;
use tracing::debug;

use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::eval::{AccumulatedPath, Evaluator, try_accumulate_path};
use crate::memory::Memory;

/// `setPathToValue(path, value)`: store `value` at the memory path written
/// as the first argument and return it.
pub fn set_path_to_value(
    args: &[Expr],
    evaluator: &Evaluator<'_>,
    memory: &mut dyn Memory,
) -> ExpressionResult<Value> {
    let AccumulatedPath { path, left } = try_accumulate_path(&args[0], evaluator, memory)?;
    let path = match (path, left) {
        (Some(path), None) => path,
        _ => {
            return Err(ExpressionError::invalid_argument(
                "setPathToValue",
                format!("{} is not a memory path", args[0]),
            ));
        }
    };

    let value = evaluator.eval(&args[1], memory)?;
    debug!(path = %path, "Setting memory path");
    memory.set_value(&path, value.clone())?;
    Ok(value)
}
