use std::collections::VecDeque;

use serde_json::Value;

use super::Evaluator;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::memory::Memory;
use crate::memory::path::quote_key;

/// Result of walking an accessor chain
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatedPath<'e> {
    /// Memory path built from the chain, if any accessor was seen
    pub path: Option<String>,
    /// First node that is not an accessor; the path applies to its value
    pub left: Option<&'e Expr>,
}

/// Turn an accessor chain into a memory path.
///
/// Walks from the outermost accessor inwards. Index expressions are
/// evaluated against `memory` and spliced in as `[n]` or `['key']`. The walk
/// stops at an identifier (the path is rooted in memory) or at any other
/// node, which is returned as `left`: `json(x).b` gives path `b` with
/// `json(x)` left over.
pub fn try_accumulate_path<'e>(
    expr: &'e Expr,
    evaluator: &Evaluator<'_>,
    memory: &mut dyn Memory,
) -> ExpressionResult<AccumulatedPath<'e>> {
    let mut segments: VecDeque<String> = VecDeque::new();
    let mut current = expr;

    let left = loop {
        match current {
            Expr::PropertyAccess { object, property } => {
                segments.push_front(property.to_string());
                current = object;
            }
            Expr::Identifier(name) => {
                segments.push_front(name.to_string());
                break None;
            }
            Expr::IndexAccess { object, index } => {
                let segment = match evaluator.eval(index, memory)? {
                    Value::Number(n) if n.is_i64() => format!("[{}]", n),
                    Value::String(key) => quote_key(&key),
                    _ => {
                        return Err(ExpressionError::eval_error(format!(
                            "{} doesn't return an int or string",
                            index
                        )));
                    }
                };
                segments.push_front(segment);
                current = object;
            }
            other => break Some(other),
        }
    };

    let path = if segments.is_empty() {
        None
    } else {
        let mut path = String::new();
        for segment in segments {
            if !path.is_empty() && !segment.starts_with('[') {
                path.push('.');
            }
            path.push_str(&segment);
        }
        Some(path)
    };

    Ok(AccumulatedPath { path, left })
}
