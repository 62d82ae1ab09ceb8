//! Regular expression matching

use ::regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::get_text_arg;
use crate::context::EvaluationContext;
use crate::core::error::{ExpressionError, ExpressionResult};

/// Test `text` against `pattern`, compiling through the context's cache
pub fn is_match(args: &[Value], ctx: &EvaluationContext) -> ExpressionResult<Value> {
    let text = get_text_arg("isMatch", args, 0, "text")?;
    let pattern = get_text_arg("isMatch", args, 1, "pattern")?;
    let regex = compile(&pattern, ctx)?;
    Ok(Value::Bool(regex.is_match(&text)))
}

fn compile(pattern: &str, ctx: &EvaluationContext) -> ExpressionResult<Regex> {
    let max_len = ctx.max_regex_pattern_len();
    if pattern.len() > max_len {
        return Err(ExpressionError::regex_error(format!(
            "Regex pattern too long: {} chars (max {})",
            pattern.len(),
            max_len
        )));
    }

    if let Some(regex) = ctx.regex_cache().get(pattern) {
        return Ok(regex);
    }

    let regex = Regex::new(pattern)?;
    debug!(pattern, "Compiled regex pattern");
    ctx.regex_cache().insert(pattern.to_string(), regex.clone());
    Ok(regex)
}
