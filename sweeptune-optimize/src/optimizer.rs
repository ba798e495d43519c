//! Sweep controller
//!
//! Level 1 - Orchestration and Level 2 - Phases
//!
//! A sweep moves through `Parsing -> Enumerating -> Evaluating -> Ranking ->
//! Reporting -> [Persisting] -> Done`. Trials are evaluated strictly one after
//! another; only the matches inside a pairing run in parallel.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use rand::Rng;
use serde::Serialize;
use sweeptune_core::{
    materialize, materialize_text, open_sink, persist_in_place, Directives, ReportSink, Result,
    TuneError,
};
use sweeptune_tournament::{evaluate_pairing, mean_std, EvalConfig, Simulator, Tally};

use crate::config::OptimizeConfig;
use crate::ranking::{format_values, rank, TrialStatistic, UnrankedTrial};
use crate::trials::{case_breakdown, enumerate_trials, Trial};

/// Stage of a sweep, logged as the controller moves through it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Parsing,
    Enumerating,
    Evaluating,
    Ranking,
    Reporting,
    Persisting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Parsing => "parsing",
            Phase::Enumerating => "enumerating",
            Phase::Evaluating => "evaluating",
            Phase::Ranking => "ranking",
            Phase::Reporting => "reporting",
            Phase::Persisting => "persisting",
            Phase::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of a complete sweep
#[derive(Clone, Debug, Serialize)]
pub struct OptimizeReport {
    /// Swept variable names, in declaration order
    pub variables: Vec<String>,
    /// Ranked trials, best first
    pub ranked: Vec<TrialStatistic>,
    /// Trials whose statistics could not be computed
    pub unranked: Vec<UnrankedTrial>,
    pub total_trials: usize,
    pub elapsed_secs: f64,
    /// The base configuration was rewritten with the best values
    pub persisted: bool,
}

impl OptimizeReport {
    pub fn best(&self) -> Option<&TrialStatistic> {
        self.ranked.first()
    }
}

enum TrialOutcome {
    Ranked(TrialStatistic),
    Unranked(UnrankedTrial),
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Parse the configuration at `base_path` and sweep it.
///
/// Report text goes to stdout, duplicated into the configuration's
/// `log_file` when one is declared.
pub fn run_sweep(
    base_path: &Path,
    simulator: Arc<dyn Simulator>,
    config: &OptimizeConfig,
) -> Result<OptimizeReport> {
    enter(Phase::Parsing);
    let directives = Directives::load(base_path)?;
    let mut sink = open_sink(directives.options.log_file.as_deref())?;

    optimize(base_path, &directives, simulator, config, sink.as_mut())
}

/// Sweep already parsed `directives` over the configuration at `base_path`
pub fn optimize(
    base_path: &Path,
    directives: &Directives,
    simulator: Arc<dyn Simulator>,
    config: &OptimizeConfig,
    sink: &mut dyn ReportSink,
) -> Result<OptimizeReport> {
    let start = Instant::now();

    enter(Phase::Enumerating);
    let ranges = directives.candidate_ranges();
    let trials = enumerate_trials(&ranges);
    check_substitution(base_path, directives, &trials)?;

    let eval_config = config.eval_config(directives.options.num_matches);
    announce(sink, directives, &ranges, trials.len(), &eval_config)?;

    enter(Phase::Evaluating);
    let mut rng = config.create_rng();
    let (stats, unranked) = evaluate_trials(
        base_path,
        directives,
        &trials,
        &simulator,
        &eval_config,
        &mut rng,
        sink,
    )?;

    enter(Phase::Ranking);
    let ranked = rank(stats);

    enter(Phase::Reporting);
    report(sink, &ranked, &unranked, start.elapsed())?;

    let persisted = if directives.options.save_optimum {
        enter(Phase::Persisting);
        persist_best(base_path, directives, ranked.first(), sink)?
    } else {
        false
    };

    sink.flush()?;
    enter(Phase::Done);

    Ok(OptimizeReport {
        variables: directives
            .variable_names()
            .into_iter()
            .map(String::from)
            .collect(),
        ranked,
        unranked,
        total_trials: trials.len(),
        elapsed_secs: start.elapsed().as_secs_f64(),
        persisted,
    })
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Fail before any match is played when a swept variable cannot be substituted
fn check_substitution(base_path: &Path, directives: &Directives, trials: &[Trial]) -> Result<()> {
    if let Some(first) = trials.first() {
        let base = std::fs::read_to_string(base_path)?;
        materialize_text(&base, &first.assignments(&directives.rules))?;
    }
    Ok(())
}

/// Run header: start time, workload and candidate values per variable
fn announce(
    sink: &mut dyn ReportSink,
    directives: &Directives,
    ranges: &[Vec<f64>],
    num_trials: usize,
    eval_config: &EvalConfig,
) -> Result<()> {
    let breakdown = if ranges.is_empty() {
        "1".to_string()
    } else {
        case_breakdown(ranges)
    };
    let total_matches = num_trials * eval_config.num_matches * directives.opponents.len();

    sink.write_line(&format!("Starting optimization at {}.", clock_time(Local::now())))?;
    sink.write_line(&format!(
        "Running {} = {} test cases of {} matches ({} total) each over {} processes",
        breakdown, num_trials, eval_config.num_matches, total_matches, eval_config.pool_size
    ))?;
    for (rule, range) in directives.rules.iter().zip(ranges) {
        sink.write_line(&format!("{:>15} - {}", rule.name, format_values(range)))?;
    }
    sink.write_line("")?;
    sink.flush()?;

    tracing::info!(
        "Sweeping {} trial(s) against {} opponent(s)",
        num_trials,
        directives.opponents.len()
    );
    Ok(())
}

/// Evaluate every trial in enumeration order
fn evaluate_trials<R: Rng>(
    base_path: &Path,
    directives: &Directives,
    trials: &[Trial],
    simulator: &Arc<dyn Simulator>,
    eval_config: &EvalConfig,
    rng: &mut R,
    sink: &mut dyn ReportSink,
) -> Result<(Vec<TrialStatistic>, Vec<UnrankedTrial>)> {
    let sweep_start = Instant::now();
    let mut stats = Vec::with_capacity(trials.len());
    let mut unranked = Vec::new();

    for (done, trial) in (1..).zip(trials) {
        let trial_start = Instant::now();
        let outcome = evaluate_trial(
            base_path,
            directives,
            trial,
            simulator,
            eval_config,
            rng,
            sink,
        )?;

        let summary = match &outcome {
            TrialOutcome::Ranked(stat) => stat.to_string(),
            TrialOutcome::Unranked(trial) => trial.to_string(),
        };
        let eta = estimate_completion(sweep_start.elapsed(), done, trials.len());
        sink.write_line(&format!(
            "{} in {:5.1}s. ({:4}/{:4}) Done at {}",
            summary,
            trial_start.elapsed().as_secs_f64(),
            done,
            trials.len(),
            eta
        ))?;
        sink.flush()?;

        match outcome {
            TrialOutcome::Ranked(stat) => stats.push(stat),
            TrialOutcome::Unranked(trial) => unranked.push(trial),
        }
    }

    Ok((stats, unranked))
}

/// Final section: best trial, full ranking and anything left unranked
fn report(
    sink: &mut dyn ReportSink,
    ranked: &[TrialStatistic],
    unranked: &[UnrankedTrial],
    elapsed: Duration,
) -> Result<()> {
    sink.write_line("")?;
    sink.write_line(&format!(
        "Final Results in {:6.1}s at {}",
        elapsed.as_secs_f64(),
        clock_time(Local::now())
    ))?;
    sink.write_line("Best Result:")?;
    match ranked.first() {
        Some(best) => sink.write_line(&best.to_string())?,
        None => sink.write_line("No trial could be ranked")?,
    }
    sink.write_line("")?;

    sink.write_line("Sorted Results:")?;
    for stat in ranked {
        sink.write_line(&stat.to_string())?;
    }

    if !unranked.is_empty() {
        sink.write_line("")?;
        sink.write_line("Unranked Results:")?;
        for trial in unranked {
            sink.write_line(&trial.to_string())?;
        }
    }
    Ok(())
}

/// Rewrite the base configuration with the best trial's values
fn persist_best(
    base_path: &Path,
    directives: &Directives,
    best: Option<&TrialStatistic>,
    sink: &mut dyn ReportSink,
) -> Result<bool> {
    let Some(best) = best else {
        tracing::warn!(
            "No ranked trial, leaving {} unchanged",
            base_path.display()
        );
        sink.write_line(&format!(
            "Nothing to save, {} left unchanged",
            base_path.display()
        ))?;
        return Ok(false);
    };

    let trial = Trial {
        index: best.index,
        values: best.values.clone(),
    };
    persist_in_place(base_path, &trial.assignments(&directives.rules))?;

    tracing::info!("Saved trial {} to {}", best.index, base_path.display());
    sink.write_line(&format!("Saved best result to {}", base_path.display()))?;
    Ok(true)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Materialize one trial and play it against every opponent
fn evaluate_trial<R: Rng>(
    base_path: &Path,
    directives: &Directives,
    trial: &Trial,
    simulator: &Arc<dyn Simulator>,
    eval_config: &EvalConfig,
    rng: &mut R,
    sink: &mut dyn ReportSink,
) -> Result<TrialOutcome> {
    let artifact = materialize(base_path, &trial.assignments(&directives.rules))?;

    let mut tally = Tally::default();
    let mut samples = Vec::new();
    let mut timed_out = false;

    for opponent in &directives.opponents {
        let pairing = evaluate_pairing(simulator, artifact.path(), opponent, eval_config, rng, sink)?;
        tally = tally.combine(&pairing.tally);
        samples.extend(pairing.differentials());
        timed_out |= pairing.timed_out();
    }

    artifact.discard()?;

    match mean_std(&samples) {
        Ok((mean, std)) => Ok(TrialOutcome::Ranked(TrialStatistic {
            index: trial.index,
            values: trial.values.clone(),
            mean,
            std,
            tally,
            matches: samples.len(),
            timed_out,
        })),
        Err(err @ TuneError::DegenerateStatistics { .. }) => {
            tracing::warn!("Trial {} cannot be ranked: {}", trial.index, err);
            Ok(TrialOutcome::Unranked(UnrankedTrial {
                index: trial.index,
                values: trial.values.clone(),
                tally,
                timed_out,
                reason: err.to_string(),
            }))
        }
        Err(err) => Err(err),
    }
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

fn enter(phase: Phase) {
    tracing::info!("Phase: {}", phase);
}

fn clock_time(at: chrono::DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Wall-clock completion time, extrapolated from the average trial so far
fn estimate_completion(elapsed: Duration, done: usize, total: usize) -> String {
    let now = Local::now();
    if done == 0 {
        return clock_time(now);
    }

    let per_trial = elapsed.as_secs_f64() / done as f64;
    let remaining_ms = per_trial * total.saturating_sub(done) as f64 * 1000.0;
    let remaining = chrono::Duration::try_milliseconds(remaining_ms as i64).unwrap_or_else(chrono::Duration::zero);

    clock_time(now.checked_add_signed(remaining).unwrap_or(now))
}
