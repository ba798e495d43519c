//! Ranking of evaluated trials
//!
//! Trials are ordered by mean score differential, best first. Only the raw
//! mean is compared; ties keep enumeration order.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use sweeptune_tournament::Tally;

/// Statistics of one fully or partially evaluated trial
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialStatistic {
    /// Position in enumeration order
    pub index: usize,
    /// Swept values, in rule declaration order
    pub values: Vec<f64>,
    /// Mean differential over all matches against all opponents
    pub mean: f64,
    /// Sample standard deviation of the differential
    pub std: f64,
    pub tally: Tally,
    /// Matches that contributed samples
    pub matches: usize,
    /// At least one pairing was cut short by a timeout
    pub timed_out: bool,
}

/// A trial whose statistics could not be computed
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UnrankedTrial {
    pub index: usize,
    pub values: Vec<f64>,
    pub tally: Tally,
    pub timed_out: bool,
    pub reason: String,
}

/// Sort by mean differential, descending. The sort is stable.
pub fn rank(mut stats: Vec<TrialStatistic>) -> Vec<TrialStatistic> {
    stats.sort_by(|a, b| b.mean.partial_cmp(&a.mean).unwrap_or(Ordering::Equal));
    stats
}

pub(crate) fn format_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:6.2}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for TrialStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<35} - avg: {:5.1} std: {:4.1}",
            format_values(&self.values),
            self.mean,
            self.std
        )?;
        if self.timed_out {
            write!(f, " [timed out]")?;
        }
        Ok(())
    }
}

impl fmt::Display for UnrankedTrial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<35} - unranked: {}", format_values(&self.values), self.reason)?;
        if self.timed_out {
            write!(f, " [timed out]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(index: usize, mean: f64) -> TrialStatistic {
        TrialStatistic {
            index,
            values: vec![index as f64],
            mean,
            std: 1.0,
            tally: Tally::default(),
            matches: 10,
            timed_out: false,
        }
    }

    #[test]
    fn test_rank_descending_and_stable() {
        let stats = vec![stat(0, 5.0), stat(1, -2.0), stat(2, 5.0), stat(3, 0.0)];
        let ranked = rank(stats);

        let order: Vec<usize> = ranked.iter().map(|s| s.index).collect();
        assert_eq!(order, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_display() {
        let mut s = stat(0, 3.5);
        s.values = vec![8.0, 12.5];
        s.std = 4.0;
        assert_eq!(
            s.to_string(),
            format!("{:<35} - avg:   3.5 std:  4.0", "  8.00  12.50")
        );

        s.timed_out = true;
        assert!(s.to_string().ends_with(" [timed out]"));
    }

    #[test]
    fn test_unranked_display() {
        let u = UnrankedTrial {
            index: 0,
            values: vec![1.0],
            tally: Tally::default(),
            timed_out: false,
            reason: "degenerate statistics".into(),
        };
        assert!(u.to_string().ends_with("- unranked: degenerate statistics"));
        assert!(u.to_string().starts_with("  1.00"));
    }
}
