//! Expression engine with caching support
//!
//! Bundles a function registry, an evaluation context and (with the `cache`
//! feature) a bounded cache of parsed expressions keyed by source text.

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::builtins::{BuiltinRegistry, FunctionDescriptor};
use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::core::error::ExpressionResult;
use crate::expression::Expression;
use crate::memory::Memory;

#[cfg(feature = "cache")]
use moka::sync::Cache;

/// Expression engine with parsing and evaluation capabilities
pub struct ExpressionEngine {
    registry: BuiltinRegistry,
    context: EvaluationContext,
    max_parse_depth: usize,
    #[cfg(feature = "cache")]
    cache: Option<Cache<String, Expression>>,
}

impl ExpressionEngine {
    /// Engine with the default configuration
    pub fn new() -> Self {
        Self::from_config(&EngineConfig::default())
    }

    /// Engine built from configuration
    pub fn from_config(config: &EngineConfig) -> Self {
        let engine = Self {
            registry: BuiltinRegistry::new(),
            context: config.context(),
            max_parse_depth: config.max_parse_depth,
            #[cfg(feature = "cache")]
            cache: config.cache_size.map(Cache::new),
        };

        #[cfg(not(feature = "cache"))]
        if config.cache_size.is_some() {
            warn!("Expression cache requested but the `cache` feature is disabled");
        }

        debug!(
            cache_size = ?config.cache_size,
            max_recursion_depth = config.max_recursion_depth,
            "Created expression engine"
        );
        engine
    }

    /// Engine caching up to `size` parsed expressions
    pub fn with_cache_size(size: u64) -> Self {
        Self::from_config(&EngineConfig {
            cache_size: Some(size),
            ..EngineConfig::default()
        })
    }

    /// Replace the evaluation context
    pub fn with_context(mut self, context: EvaluationContext) -> Self {
        self.context = context;
        self
    }

    /// Context evaluations run with
    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Functions expressions are parsed against
    pub fn registry(&self) -> &BuiltinRegistry {
        &self.registry
    }

    /// Register a custom function, replacing any built-in of the same name.
    ///
    /// Cached expressions hold the functions they were parsed with, so the
    /// cache is cleared.
    pub fn register_function(&mut self, descriptor: FunctionDescriptor) {
        if self.registry.has_function(descriptor.name()) {
            warn!(function = descriptor.name(), "Replacing registered function");
        }
        self.registry.register(descriptor);
        self.clear_cache();
    }

    /// Parse `source`, reusing a cached expression when there is one
    pub fn parse(&self, source: &str) -> ExpressionResult<Expression> {
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.cache {
            if let Some(expression) = cache.get(source) {
                trace!(source, "Expression cache hit");
                return Ok(expression);
            }
            let expression = Expression::parse_bounded(source, &self.registry, self.max_parse_depth)?;
            cache.insert(source.to_string(), expression.clone());
            return Ok(expression);
        }

        Expression::parse_bounded(source, &self.registry, self.max_parse_depth)
    }

    /// Parse and evaluate `source` against `memory`
    pub fn evaluate(&self, source: &str, memory: &mut dyn Memory) -> ExpressionResult<Value> {
        trace!(expression = source, "Evaluating expression");
        let expression = self.parse(source)?;
        let result = expression.try_evaluate_with(memory, &self.context)?;
        trace!(result = ?result, "Expression evaluation completed");
        Ok(result)
    }

    /// Drop every cached expression
    pub fn clear_cache(&self) {
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
            debug!("Expression cache cleared");
        }
    }

    /// Number of cached expressions, after pending maintenance has run
    pub fn cached_expressions(&self) -> u64 {
        #[cfg(feature = "cache")]
        if let Some(cache) = &self.cache {
            cache.run_pending_tasks();
            return cache.entry_count();
        }
        0
    }
}

impl Default for ExpressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExpressionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionEngine")
            .field("functions", &self.registry.function_names().len())
            .field("context", &self.context)
            .field("cached_expressions", &self.cached_expressions())
            .finish()
    }
}
