//! Trial enumeration - every combination of candidate values
//!
//! Level 2 - Phase-level implementation

use sweeptune_core::{Assignment, SweepRule};

/// One assignment of a concrete value to every swept variable
#[derive(Clone, Debug, PartialEq)]
pub struct Trial {
    /// Position in enumeration order
    pub index: usize,
    /// One value per rule, in rule declaration order
    pub values: Vec<f64>,
}

impl Trial {
    /// Pair each value with its rule's variable name
    pub fn assignments(&self, rules: &[SweepRule]) -> Vec<Assignment> {
        rules
            .iter()
            .zip(&self.values)
            .map(|(rule, &value)| Assignment::new(rule.name.clone(), value))
            .collect()
    }
}

/// Cartesian product of `ranges`, preserving range order within each trial.
///
/// The last range varies fastest. With no ranges there is exactly one,
/// empty, trial.
pub fn enumerate_trials(ranges: &[Vec<f64>]) -> Vec<Trial> {
    let mut combos: Vec<Vec<f64>> = vec![Vec::new()];

    for range in ranges {
        combos = combos
            .iter()
            .flat_map(|prefix| {
                range.iter().map(move |&value| {
                    let mut combo = prefix.clone();
                    combo.push(value);
                    combo
                })
            })
            .collect();
    }

    combos
        .into_iter()
        .enumerate()
        .map(|(index, values)| Trial { index, values })
        .collect()
}

/// Number of trials the product of `ranges` yields
pub fn trial_count(ranges: &[Vec<f64>]) -> usize {
    ranges.iter().map(Vec::len).product()
}

/// `3*4` style breakdown of the trial count
pub fn case_breakdown(ranges: &[Vec<f64>]) -> String {
    ranges
        .iter()
        .map(|r| r.len().to_string())
        .collect::<Vec<_>>()
        .join("*")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sweeptune_core::SweepKind;

    #[test]
    fn test_enumerate_three_by_four() {
        let ranges = vec![vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0, 40.0]];
        let trials = enumerate_trials(&ranges);

        assert_eq!(trials.len(), 12);
        assert_eq!(trial_count(&ranges), 12);
        assert_eq!(case_breakdown(&ranges), "3*4");

        for (i, a) in trials.iter().enumerate() {
            assert_eq!(a.index, i);
            assert_eq!(a.values.len(), 2);
            for b in &trials[i + 1..] {
                assert_ne!(a.values, b.values);
            }
        }

        // Declaration order within a trial, last variable fastest
        assert_eq!(trials[0].values, vec![1.0, 10.0]);
        assert_eq!(trials[1].values, vec![1.0, 20.0]);
        assert_eq!(trials[4].values, vec![2.0, 10.0]);
        assert_eq!(trials[11].values, vec![3.0, 40.0]);
    }

    #[test]
    fn test_enumerate_nothing_swept() {
        let trials = enumerate_trials(&[]);
        assert_eq!(trials, vec![Trial { index: 0, values: vec![] }]);
        assert_eq!(trial_count(&[]), 1);
    }

    #[test]
    fn test_assignments_follow_rules() {
        let rules = vec![
            SweepRule {
                name: "hp".into(),
                original: 10.0,
                kind: SweepKind::List { values: vec![8.0] },
                line: 2,
            },
            SweepRule {
                name: "range".into(),
                original: 3.0,
                kind: SweepKind::AddSteps { delta: 1.0, count: 3 },
                line: 4,
            },
        ];
        let trial = Trial { index: 0, values: vec![8.0, 2.0] };

        let assignments = trial.assignments(&rules);
        assert_eq!(
            assignments,
            vec![Assignment::new("hp", 8.0), Assignment::new("range", 2.0)]
        );
    }
}
