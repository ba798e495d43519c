//! Configuration types for pairing evaluation
//!
//! Level 4 - Utilities and configuration

use std::time::Duration;

/// Longest wait for any single match result before the pairing is abandoned
pub const DEFAULT_MATCH_TIMEOUT: Duration = Duration::from_secs(50);

/// Number of workers when none is requested: one per available processor
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Configuration for evaluating one candidate against one opponent
#[derive(Clone, Debug)]
pub struct EvalConfig {
    /// Matches per pairing
    pub num_matches: usize,
    /// Workers in the per-pairing pool
    pub pool_size: usize,
    /// Per-result wait ceiling
    pub match_timeout: Duration,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            num_matches: 25,
            pool_size: default_pool_size(),
            match_timeout: DEFAULT_MATCH_TIMEOUT,
        }
    }
}

impl EvalConfig {
    /// Create config with specified matches per pairing
    pub fn new(num_matches: usize) -> Self {
        Self {
            num_matches,
            ..Default::default()
        }
    }

    /// Set worker pool size (at least one worker)
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size.max(1);
        self
    }

    /// Set per-match wait ceiling
    pub fn with_match_timeout(mut self, match_timeout: Duration) -> Self {
        self.match_timeout = match_timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_config_defaults() {
        let config = EvalConfig::default();
        assert_eq!(config.num_matches, 25);
        assert_eq!(config.match_timeout, Duration::from_secs(50));
        assert!(config.pool_size >= 1);
    }

    #[test]
    fn test_eval_config_builders() {
        let config = EvalConfig::new(8)
            .with_pool_size(0)
            .with_match_timeout(Duration::from_millis(250));
        assert_eq!(config.num_matches, 8);
        assert_eq!(config.pool_size, 1);
        assert_eq!(config.match_timeout, Duration::from_millis(250));
    }
}
