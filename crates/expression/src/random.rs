//! Injectable random number source for `rand` and `newGuid`

use std::fmt;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Source of randomness shared by concurrent evaluations
pub trait RandomSource: Send + Sync + fmt::Debug {
    /// Uniform integer in `min..max_exclusive`. Callers guarantee `min < max_exclusive`.
    fn next_in_range(&self, min: i64, max_exclusive: i64) -> i64;

    /// Fill `bytes` with random data
    fn fill_bytes(&self, bytes: &mut [u8]);
}

/// Thread-local generator from `rand`; the default source
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_in_range(&self, min: i64, max_exclusive: i64) -> i64 {
        rand::rng().random_range(min..max_exclusive)
    }

    fn fill_bytes(&self, bytes: &mut [u8]) {
        rand::rng().fill_bytes(bytes);
    }
}

/// Deterministic generator for reproducible runs and tests
pub struct SeededRandom {
    seed: u64,
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    /// Create a generator from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededRandom")
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}

impl RandomSource for SeededRandom {
    fn next_in_range(&self, min: i64, max_exclusive: i64) -> i64 {
        self.rng.lock().random_range(min..max_exclusive)
    }

    fn fill_bytes(&self, bytes: &mut [u8]) {
        self.rng.lock().fill_bytes(bytes);
    }
}
