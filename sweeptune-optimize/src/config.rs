//! Configuration for a sweep run
//!
//! Level 4 - Utilities and configuration

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sweeptune_tournament::{default_pool_size, EvalConfig, DEFAULT_MATCH_TIMEOUT};

/// Settings that do not come from the configuration's directives
#[derive(Clone, Debug)]
pub struct OptimizeConfig {
    /// Workers per pairing pool
    pub pool_size: usize,
    /// Per-match wait ceiling
    pub match_timeout: Duration,
    /// Seed for match seed draws (None = random)
    pub seed: Option<u64>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            match_timeout: DEFAULT_MATCH_TIMEOUT,
            seed: None,
        }
    }
}

impl OptimizeConfig {
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    pub fn with_match_timeout(mut self, match_timeout: Duration) -> Self {
        self.match_timeout = match_timeout;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pairing configuration for `num_matches` matches
    pub fn eval_config(&self, num_matches: usize) -> EvalConfig {
        EvalConfig::new(num_matches)
            .with_pool_size(self.pool_size)
            .with_match_timeout(self.match_timeout)
    }

    /// Create RNG from seed or random
    pub fn create_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
