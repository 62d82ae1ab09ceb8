//! AST evaluation
//!
//! A tree walk over an immutable [`Expr`]. Every node either yields a value
//! or an error, and the first error stops the walk. Lookups that find
//! nothing produce `null`, not an error.

mod accumulate;

use std::cell::Cell;

use serde_json::Value;
use tracing::trace;

use crate::builtins::FunctionKind;
use crate::context::EvaluationContext;
use crate::core::ast::Expr;
use crate::core::error::{ExpressionError, ExpressionResult};
use crate::memory::Memory;
use crate::memory::path::{PathSegment, parse_path, resolve, step};

pub use accumulate::{AccumulatedPath, try_accumulate_path};

/// Evaluator for expression ASTs
///
/// Holds only per-evaluation scratch state (the current depth), so one is
/// created for every top-level evaluation and never shared between threads.
pub struct Evaluator<'ctx> {
    context: &'ctx EvaluationContext,
    depth: Cell<usize>,
}

impl<'ctx> Evaluator<'ctx> {
    /// Create an evaluator over a context
    pub fn new(context: &'ctx EvaluationContext) -> Self {
        Self {
            context,
            depth: Cell::new(0),
        }
    }

    /// Context this evaluator reads services and limits from
    pub fn context(&self) -> &'ctx EvaluationContext {
        self.context
    }

    /// Evaluate an expression against memory
    pub fn eval(&self, expr: &Expr, memory: &mut dyn Memory) -> ExpressionResult<Value> {
        let depth = self.depth.get();
        let max_depth = self.context.max_recursion_depth();
        if depth >= max_depth {
            return Err(ExpressionError::eval_error(format!(
                "Maximum recursion depth ({}) exceeded",
                max_depth
            )));
        }

        self.depth.set(depth + 1);
        let result = self.eval_node(expr, memory);
        self.depth.set(depth);
        result
    }

    fn eval_node(&self, expr: &Expr, memory: &mut dyn Memory) -> ExpressionResult<Value> {
        match expr {
            Expr::Literal(val) => Ok(val.clone()),

            Expr::Identifier(_) | Expr::PropertyAccess { .. } => self.eval_accessor(expr, memory),

            Expr::IndexAccess { object, index } => {
                let instance = self.eval(object, memory)?;
                let key = self.eval(index, memory)?;
                access_index(&instance, &key, index)
            }

            Expr::FunctionCall { function, args } => {
                function.check_arity(args.len())?;
                trace!(function = function.name(), args = args.len(), "Calling function");

                match function.kind() {
                    FunctionKind::Lazy(lazy) => lazy(args, self, memory),
                    FunctionKind::Eager(eager) => {
                        let mut values = Vec::with_capacity(args.len());
                        for arg in args {
                            values.push(self.eval(arg, memory)?);
                        }
                        eager(&values, self.context)
                    }
                }
            }
        }
    }

    /// Identifiers and property chains: read the accumulated path from memory,
    /// or from the value of the node the chain hangs off.
    fn eval_accessor(&self, expr: &Expr, memory: &mut dyn Memory) -> ExpressionResult<Value> {
        let AccumulatedPath { path, left } = try_accumulate_path(expr, self, memory)?;

        match left {
            None => {
                let Some(path) = path else {
                    return Ok(Value::Null);
                };
                Ok(memory.get_value(&path).unwrap_or(Value::Null))
            }
            Some(left) => {
                let instance = self.eval(left, memory)?;
                let Some(path) = path else {
                    return Ok(instance);
                };
                let segments = parse_path(&path)?;
                Ok(resolve(&instance, &segments, true)
                    .cloned()
                    .unwrap_or(Value::Null))
            }
        }
    }
}

/// Index into a list by integer or into an object by string key.
fn access_index(instance: &Value, key: &Value, index: &Expr) -> ExpressionResult<Value> {
    if instance.is_null() {
        return Ok(Value::Null);
    }

    let segment = match key {
        Value::Number(n) if n.is_i64() => PathSegment::Index(n.as_i64().unwrap_or_default()),
        Value::String(key) => PathSegment::Property(key.clone()),
        _ => {
            return Err(ExpressionError::eval_error(format!(
                "{} doesn't return an int or string",
                index
            )));
        }
    };

    Ok(step(instance, &segment, true).cloned().unwrap_or(Value::Null))
}
