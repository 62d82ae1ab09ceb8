//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::context::{
    DEFAULT_MAX_RECURSION_DEPTH, DEFAULT_MAX_REGEX_PATTERN_LEN, DEFAULT_REGEX_CACHE_SIZE,
    EvaluationContext,
};
use crate::parser::DEFAULT_MAX_PARSE_DEPTH;

/// Default number of parsed expressions kept by the engine cache
pub const DEFAULT_CACHE_SIZE: u64 = 1000;

/// Expression engine configuration
///
/// Every field has a default, so a partial document (or `{}`) deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Parsed-expression cache capacity; `None` disables the cache
    pub cache_size: Option<u64>,

    /// Maximum evaluator nesting depth
    pub max_recursion_depth: usize,

    /// Maximum parser nesting depth; deeper expressions fail to parse
    pub max_parse_depth: usize,

    /// Number of compiled regex patterns kept
    pub regex_cache_size: u64,

    /// Longest accepted regex pattern, in bytes
    pub max_regex_pattern_len: usize,

    /// Seed for a deterministic random source; thread-local randomness when unset
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_size: Some(DEFAULT_CACHE_SIZE),
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_parse_depth: DEFAULT_MAX_PARSE_DEPTH,
            regex_cache_size: DEFAULT_REGEX_CACHE_SIZE,
            max_regex_pattern_len: DEFAULT_MAX_REGEX_PATTERN_LEN,
            random_seed: None,
        }
    }
}

impl EngineConfig {
    /// Build the evaluation context these settings describe
    pub fn context(&self) -> EvaluationContext {
        let builder = EvaluationContext::builder()
            .max_recursion_depth(self.max_recursion_depth)
            .regex_cache_size(self.regex_cache_size)
            .max_regex_pattern_len(self.max_regex_pattern_len);

        match self.random_seed {
            Some(seed) => builder.seed(seed).build(),
            None => builder.build(),
        }
    }
}
