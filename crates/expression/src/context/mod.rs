//! Evaluation context for expression execution
//!
//! Holds everything an evaluation reads besides memory: the random source,
//! the clock, recursion and regex limits, and the compiled-regex cache. A
//! context is cheap to clone and shared across threads.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::sync::Cache;
use regex::Regex;

use crate::random::{RandomSource, SeededRandom, ThreadRandom};

/// Maximum nesting depth the evaluator descends before failing
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 256;

/// Number of compiled patterns kept by `isMatch`
pub const DEFAULT_REGEX_CACHE_SIZE: u64 = 100;

/// Longest pattern `isMatch` accepts
pub const DEFAULT_MAX_REGEX_PATTERN_LEN: usize = 1000;

/// Evaluation context: injected services and limits
#[derive(Clone)]
pub struct EvaluationContext {
    random: Arc<dyn RandomSource>,
    fixed_now: Option<DateTime<Utc>>,
    max_recursion_depth: usize,
    max_regex_pattern_len: usize,
    regex_cache: Cache<String, Regex>,
}

impl EvaluationContext {
    /// Create a context with the thread-local random source and the system clock
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for constructing contexts
    pub fn builder() -> EvaluationContextBuilder {
        EvaluationContextBuilder::new()
    }

    /// Random source used by `rand` and `newGuid`
    pub fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }

    /// Current time, or the fixed instant when one was configured
    pub fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Maximum evaluator nesting depth
    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }

    /// Longest accepted regex pattern, in bytes
    pub fn max_regex_pattern_len(&self) -> usize {
        self.max_regex_pattern_len
    }

    /// Compiled-pattern cache shared by clones of this context
    pub fn regex_cache(&self) -> &Cache<String, Regex> {
        &self.regex_cache
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationContext")
            .field("random", &self.random)
            .field("fixed_now", &self.fixed_now)
            .field("max_recursion_depth", &self.max_recursion_depth)
            .field("max_regex_pattern_len", &self.max_regex_pattern_len)
            .field("cached_regexes", &self.regex_cache.entry_count())
            .finish()
    }
}

/// Builder for creating evaluation contexts
#[derive(Debug, Clone)]
pub struct EvaluationContextBuilder {
    random: Option<Arc<dyn RandomSource>>,
    fixed_now: Option<DateTime<Utc>>,
    max_recursion_depth: usize,
    max_regex_pattern_len: usize,
    regex_cache_size: u64,
}

impl Default for EvaluationContextBuilder {
    fn default() -> Self {
        Self {
            random: None,
            fixed_now: None,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_regex_pattern_len: DEFAULT_MAX_REGEX_PATTERN_LEN,
            regex_cache_size: DEFAULT_REGEX_CACHE_SIZE,
        }
    }
}

impl EvaluationContextBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom random source
    pub fn random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = Some(random);
        self
    }

    /// Use a deterministic generator seeded with `seed`
    pub fn seed(self, seed: u64) -> Self {
        self.random_source(Arc::new(SeededRandom::new(seed)))
    }

    /// Freeze the clock seen by `utcNow`, `getPastTime` and friends
    pub fn fixed_time(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    /// Set the maximum evaluator nesting depth
    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Set the longest accepted regex pattern
    pub fn max_regex_pattern_len(mut self, len: usize) -> Self {
        self.max_regex_pattern_len = len;
        self
    }

    /// Set how many compiled patterns are cached
    pub fn regex_cache_size(mut self, size: u64) -> Self {
        self.regex_cache_size = size;
        self
    }

    /// Build the evaluation context
    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            random: self.random.unwrap_or_else(|| Arc::new(ThreadRandom)),
            fixed_now: self.fixed_now,
            max_recursion_depth: self.max_recursion_depth,
            max_regex_pattern_len: self.max_regex_pattern_len,
            regex_cache: Cache::new(self.regex_cache_size),
        }
    }
}
