#![warn(clippy::all)]
#![warn(missing_docs)]
//! # adaptive-expression
//!
//! Expression language for conversational bots. Expressions are parsed once
//! into an immutable tree and evaluated against a [`Memory`]: a JSON-like
//! store addressed by paths such as `turn.entities[0].name`.
//!
//! The language supports:
//! - Arithmetic operators: `+`, `-`, `*`, `/`, `%`, `^`
//! - Comparison operators: `==`, `!=`, `<>`, `>`, `<`, `>=`, `<=`
//! - Logical operators: `&&`, `||`, `!`
//! - String concatenation: `&`
//! - Property and index access: `user.name`, `items[0]`, `bag['key']`
//! - Function calls from a library of about 150 built-ins
//!
//! Evaluation never panics on bad data. Missing paths read as `null`, and
//! everything else that goes wrong comes back as an [`ExpressionError`].
//!
//! ## Quick Start
//!
//! ```rust
//! use adaptive_expression::{Expression, SimpleObjectMemory};
//! use serde_json::json;
//!
//! let expression = Expression::parse("concat(user.name, ' has ', count(items), ' items')").unwrap();
//! let mut memory = SimpleObjectMemory::new(json!({
//!     "user": {"name": "Ann"},
//!     "items": [1, 2, 3]
//! }));
//!
//! let value = expression.try_evaluate(&mut memory).unwrap();
//! assert_eq!(value, json!("Ann has 3 items"));
//! assert!(expression.references().contains("user.name"));
//! ```
//!
//! ## With Caching
//!
//! ```rust
//! use adaptive_expression::{ExpressionEngine, MapMemory};
//! use serde_json::json;
//!
//! let engine = ExpressionEngine::with_cache_size(1000);
//! let mut memory = MapMemory::new();
//! assert_eq!(engine.evaluate("1 + 2 * 3", &mut memory).unwrap(), json!(7));
//! ```

pub mod builtins;
pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod error;
pub mod error_formatter;
pub mod eval;
pub mod expression;
pub mod lexer;
pub mod memory;
pub mod parser;
pub mod random;
pub mod references;
pub mod value_utils;

// Re-exports
pub use builtins::{Arity, BuiltinRegistry, FunctionDescriptor, FunctionKind};
pub use config::EngineConfig;
pub use context::{EvaluationContext, EvaluationContextBuilder};
pub use core::ast::Expr;
pub use engine::ExpressionEngine;
pub use error::{EvaluationResult, ExpressionError, ExpressionResult};
pub use error_formatter::format_error;
pub use eval::AccumulatedPath;
pub use expression::Expression;
pub use memory::{JsonMemory, MapMemory, Memory, SimpleObjectMemory, StackedMemory};
pub use random::{RandomSource, SeededRandom, ThreadRandom};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        EngineConfig, EvaluationContext, Expression, ExpressionEngine, ExpressionError,
        ExpressionResult, JsonMemory, MapMemory, Memory, SimpleObjectMemory,
    };
}
