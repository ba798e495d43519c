//! sweeptune Optimize - Sweep controller
//!
//! This crate drives a complete sweep:
//! - Trial enumeration (cartesian product of candidate values)
//! - Evaluation of every trial against every opponent
//! - Ranking by mean score differential
//! - Progress/ETA reporting and optional persistence of the optimum
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run_sweep, optimize (orchestration)
//! - Level 2: announce, evaluate_trials, rank, report, persist (phases)
//! - Level 3: evaluate_trial (steps)
//! - Level 4: formatting, configuration

mod config;
mod optimizer;
mod ranking;
mod trials;

pub use config::OptimizeConfig;
pub use optimizer::{optimize, run_sweep, OptimizeReport, Phase};
pub use ranking::{rank, TrialStatistic, UnrankedTrial};
pub use trials::{case_breakdown, enumerate_trials, trial_count, Trial};
