//! Match statistics - tallies and differential summaries
//!
//! Level 4 - Utilities

use std::fmt;

use serde::Serialize;
use sweeptune_core::{Result, TuneError};

use crate::simulator::{MatchOutcome, Verdict};

/// Win/loss/draw counts from the first competitor's point of view
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl Tally {
    /// Count one match
    pub fn record(&mut self, outcome: &MatchOutcome) {
        match outcome.verdict() {
            Verdict::Win => self.wins += 1,
            Verdict::Loss => self.losses += 1,
            Verdict::Draw => self.draws += 1,
        }
    }

    /// Total matches counted
    pub fn total(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Combine two tallies
    pub fn combine(&self, other: &Tally) -> Tally {
        Tally {
            wins: self.wins + other.wins,
            losses: self.losses + other.losses,
            draws: self.draws + other.draws,
        }
    }

    /// Win rate (wins / total matches)
    pub fn win_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.wins as f64 / total as f64
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.wins, self.losses, self.draws)
    }
}

/// Mean and unbiased sample standard deviation (variance divided by `n - 1`)
pub fn mean_std(samples: &[f64]) -> Result<(f64, f64)> {
    let n = samples.len();
    if n < 2 {
        return Err(TuneError::DegenerateStatistics { samples: n });
    }

    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;

    Ok((mean, variance.sqrt()))
}
