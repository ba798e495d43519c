//! sweeptune Tournament - Candidate evaluation through simulated matches
//!
//! This crate provides the match infrastructure of a sweep:
//! - The simulator contract and a child-process simulator
//! - Single match execution (the unit of work for the worker pool)
//! - Pairing evaluation: N matches over a fresh worker pool, with timeout
//! - Win/loss/draw tallies and score-differential statistics
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: evaluate_pairing (orchestration)
//! - Level 2: submit matches, collect results (phases)
//! - Level 3: run_match, progress bar steps
//! - Level 4: statistics, configuration

mod config;
mod match_play;
mod simulator;
mod stats;

pub use config::{default_pool_size, EvalConfig, DEFAULT_MATCH_TIMEOUT};
pub use match_play::{evaluate_pairing, run_match, MatchTimeout, PairingResult};
pub use simulator::{CommandSimulator, MatchOutcome, Simulator, Verdict, DEFAULT_MAX_SEED};
pub use stats::{mean_std, Tally};
