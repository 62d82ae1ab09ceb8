//! Parsed expressions
//!
//! An [`Expression`] owns an immutable tree and can be evaluated any number
//! of times, from any number of threads, against different memories.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock};

use serde_json::Value;
use tracing::trace;

use crate::builtins::BuiltinRegistry;
use crate::context::EvaluationContext;
use crate::core::ast::Expr;
use crate::core::error::ExpressionResult;
use crate::eval::{AccumulatedPath, Evaluator, try_accumulate_path};
use crate::lexer::Lexer;
use crate::memory::Memory;
use crate::parser::{DEFAULT_MAX_PARSE_DEPTH, Parser};
use crate::references::collect_references;

static DEFAULT_REGISTRY: LazyLock<BuiltinRegistry> = LazyLock::new(BuiltinRegistry::new);
static DEFAULT_CONTEXT: LazyLock<EvaluationContext> = LazyLock::new(EvaluationContext::new);

/// A parsed, immutable expression
#[derive(Clone)]
pub struct Expression {
    root: Arc<Expr>,
    source: Arc<str>,
    references: Arc<OnceLock<BTreeSet<String>>>,
}

impl Expression {
    /// Parse with the built-in function library
    pub fn parse(source: &str) -> ExpressionResult<Self> {
        Self::parse_with(source, &DEFAULT_REGISTRY)
    }

    /// Parse resolving function names against `registry`
    pub fn parse_with(source: &str, registry: &BuiltinRegistry) -> ExpressionResult<Self> {
        Self::parse_bounded(source, registry, DEFAULT_MAX_PARSE_DEPTH)
    }

    /// Parse against `registry`, failing past `max_depth` levels of nesting
    pub fn parse_bounded(
        source: &str,
        registry: &BuiltinRegistry,
        max_depth: usize,
    ) -> ExpressionResult<Self> {
        let tokens = Lexer::new(source).tokenize()?;
        let root = Parser::new(tokens, registry)
            .with_max_depth(max_depth)
            .parse()?;
        trace!(source, "Parsed expression");

        Ok(Self {
            root: Arc::new(root),
            source: Arc::from(source),
            references: Arc::new(OnceLock::new()),
        })
    }

    /// Text the expression was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Root of the syntax tree
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Evaluate against `memory` with a shared default context
    pub fn try_evaluate(&self, memory: &mut dyn Memory) -> ExpressionResult<Value> {
        self.try_evaluate_with(memory, &DEFAULT_CONTEXT)
    }

    /// Evaluate against `memory` with an explicit context
    pub fn try_evaluate_with(
        &self,
        memory: &mut dyn Memory,
        context: &EvaluationContext,
    ) -> ExpressionResult<Value> {
        Evaluator::new(context).eval(&self.root, memory)
    }

    /// Memory paths this expression reads, computed on first use
    pub fn references(&self) -> &BTreeSet<String> {
        self.references.get_or_init(|| collect_references(&self.root))
    }

    /// Memory path denoted by the expression, evaluating any computed indices
    pub fn try_accumulate_path(&self, memory: &mut dyn Memory) -> ExpressionResult<AccumulatedPath<'_>> {
        let evaluator = Evaluator::new(&DEFAULT_CONTEXT);
        try_accumulate_path(&self.root, &evaluator, memory)
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Expression")
            .field("source", &self.source)
            .field("root", &self.root)
            .finish()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleObjectMemory;
    use serde_json::json;

    #[test]
    fn test_parse_and_evaluate() {
        let expression = Expression::parse("one + two * 3").unwrap();
        let mut memory = SimpleObjectMemory::new(json!({"one": 1, "two": 2}));
        assert_eq!(expression.try_evaluate(&mut memory).unwrap(), json!(7));
        assert_eq!(expression.source(), "one + two * 3");
    }

    #[test]
    fn test_references_are_cached_across_clones() {
        let expression = Expression::parse("a.b + c[0]").unwrap();
        let copy = expression.clone();
        let expected: BTreeSet<String> = ["a.b", "c[0]"].iter().map(|s| s.to_string()).collect();
        assert_eq!(expression.references(), &expected);
        assert!(std::ptr::eq(expression.references(), copy.references()));
    }

    #[test]
    fn test_unknown_function_fails_at_parse() {
        let err = Expression::parse("nope(1)").unwrap_err();
        assert_eq!(err.code(), "EXPR:PARSE");
        assert!(err.to_string().contains("nope does not have an evaluator"));
    }

    #[test]
    fn test_expression_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Expression>();
    }

    #[test]
    fn test_context_fixes_clock() {
        let now = chrono::DateTime::parse_from_rfc3339("2018-03-15T13:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let context = EvaluationContext::builder().fixed_time(now).build();
        let expression = Expression::parse("utcNow()").unwrap();
        let mut memory = SimpleObjectMemory::new(json!({}));
        assert_eq!(
            expression.try_evaluate_with(&mut memory, &context).unwrap(),
            json!("2018-03-15T13:00:00.000Z")
        );
    }
}
