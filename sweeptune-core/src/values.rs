//! Candidate value generation
//!
//! Pure numeric routines: evenly spaced sequences and the three sweep kinds
//! built on top of them.

use serde::Serialize;

/// Lazy sequence of evenly spaced values, see [`linspace`]
#[derive(Clone, Debug)]
pub struct Linspace {
    start: f64,
    step: f64,
    stop: f64,
    len: usize,
    next: usize,
}

/// Produce `n` evenly spaced values from `start` to `stop` inclusive.
///
/// When `n < 2` the sequence holds the single value `stop`.
/// The iterator is `Clone`, so a sequence can be restarted from a saved copy.
pub fn linspace(start: f64, stop: f64, n: usize) -> Linspace {
    if n < 2 {
        return Linspace {
            start: stop,
            step: 0.0,
            stop,
            len: 1,
            next: 0,
        };
    }

    Linspace {
        start,
        step: (stop - start) / (n - 1) as f64,
        stop,
        len: n,
        next: 0,
    }
}

impl Iterator for Linspace {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next >= self.len {
            return None;
        }
        let i = self.next;
        self.next += 1;

        // Pin the last element so rounding never moves the endpoint
        if i + 1 == self.len {
            Some(self.stop)
        } else {
            Some(self.start + self.step * i as f64)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Linspace {}

/// How the candidate values of a swept variable are generated
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepKind {
    /// Explicit values, used as given
    List { values: Vec<f64> },
    /// `count` values `original * factor^t`, `t` evenly spaced over [-1, 1]
    MultSteps { factor: f64, count: usize },
    /// `count` values evenly spaced over [original - delta, original + delta]
    AddSteps { delta: f64, count: usize },
}

impl SweepKind {
    /// Candidate values for a variable whose current value is `original`
    pub fn candidates(&self, original: f64) -> Vec<f64> {
        match self {
            SweepKind::List { values } => values.clone(),
            SweepKind::MultSteps { factor, count } => linspace(-1.0, 1.0, *count)
                .map(|t| original * factor.powf(t))
                .collect(),
            SweepKind::AddSteps { delta, count } => {
                linspace(original - delta, original + delta, *count).collect()
            }
        }
    }

    /// Directive keyword for this kind
    pub fn keyword(&self) -> &'static str {
        match self {
            SweepKind::List { .. } => "list",
            SweepKind::MultSteps { .. } => "multsteps",
            SweepKind::AddSteps { .. } => "addsteps",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "{:?} vs {:?}", actual, expected);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{:?} vs {:?}", actual, expected);
        }
    }

    #[test]
    fn test_linspace_endpoints_and_length() {
        for n in 2..12 {
            let values: Vec<f64> = linspace(-3.0, 7.5, n).collect();
            assert_eq!(values.len(), n);
            assert_eq!(values[0], -3.0);
            assert_eq!(*values.last().unwrap(), 7.5);
            assert!(values.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_linspace_descending() {
        let values: Vec<f64> = linspace(1.0, -1.0, 5).collect();
        assert_close(&values, &[1.0, 0.5, 0.0, -0.5, -1.0]);
    }

    #[test]
    fn test_linspace_degenerate_yields_stop() {
        assert_eq!(linspace(1.0, 9.0, 1).collect::<Vec<_>>(), vec![9.0]);
        assert_eq!(linspace(1.0, 9.0, 0).collect::<Vec<_>>(), vec![9.0]);
    }

    #[test]
    fn test_linspace_is_restartable() {
        let seq = linspace(0.0, 1.0, 3);
        let first: Vec<f64> = seq.clone().collect();
        let second: Vec<f64> = seq.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_linspace_size_hint() {
        let mut seq = linspace(0.0, 1.0, 4);
        assert_eq!(seq.len(), 4);
        seq.next();
        assert_eq!(seq.len(), 3);
    }

    #[test]
    fn test_multsteps_geometric_around_original() {
        let kind = SweepKind::MultSteps { factor: 2.0, count: 3 };
        assert_close(&kind.candidates(10.0), &[5.0, 10.0, 20.0]);
    }

    #[test]
    fn test_addsteps_linear_around_original() {
        let kind = SweepKind::AddSteps { delta: 4.0, count: 3 };
        assert_close(&kind.candidates(10.0), &[6.0, 10.0, 14.0]);
    }

    #[test]
    fn test_single_step_collapses() {
        // linspace(-1, 1, 1) yields 1.0, so the single value is original * factor
        let kind = SweepKind::MultSteps { factor: 3.0, count: 1 };
        assert_close(&kind.candidates(2.0), &[6.0]);

        let kind = SweepKind::AddSteps { delta: 4.0, count: 1 };
        assert_close(&kind.candidates(10.0), &[14.0]);
    }

    #[test]
    fn test_list_ignores_original() {
        let kind = SweepKind::List { values: vec![8.0, 10.0, 12.0] };
        assert_eq!(kind.candidates(99.0), vec![8.0, 10.0, 12.0]);
        assert_eq!(kind.keyword(), "list");
    }
}
