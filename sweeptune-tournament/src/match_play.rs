//! Pairing evaluation - many matches between a candidate and one opponent
//!
//! Level 1 - Orchestration and Level 2 - Phases

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use rand::Rng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use sweeptune_core::{ReportSink, Result, TuneError};

use crate::config::EvalConfig;
use crate::simulator::{MatchOutcome, Simulator};
use crate::stats::{mean_std, Tally};

const PROGRESS_CELLS: usize = 10;

/// A pairing stopped early because one match result did not arrive in time,
/// or its simulator was killed at the match deadline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MatchTimeout {
    /// Matches whose results were collected before the timeout
    pub completed: usize,
    /// Matches the pairing asked for
    pub requested: usize,
    /// The wait ceiling that was exceeded
    pub waited: Duration,
}

/// Result of one pairing (complete or cut short by a timeout)
#[derive(Clone, Debug)]
pub struct PairingResult {
    /// Opponent artifact
    pub opponent: PathBuf,
    /// Candidate's wins, losses and draws
    pub tally: Tally,
    /// Summed scores `[candidate, opponent]`
    pub total_scores: [f64; 2],
    /// Every collected outcome, in submission order
    pub outcomes: Vec<MatchOutcome>,
    /// Wall-clock time of the pairing
    pub elapsed: Duration,
    /// Set when the pairing ended early
    pub timeout: Option<MatchTimeout>,
}

impl PairingResult {
    fn new(opponent: &Path, requested: usize) -> Self {
        Self {
            opponent: opponent.to_path_buf(),
            tally: Tally::default(),
            total_scores: [0.0, 0.0],
            outcomes: Vec::with_capacity(requested),
            elapsed: Duration::ZERO,
            timeout: None,
        }
    }

    /// Account for one outcome
    fn record(&mut self, outcome: MatchOutcome) {
        self.tally.record(&outcome);
        self.total_scores[0] += outcome.score_a;
        self.total_scores[1] += outcome.score_b;
        self.outcomes.push(outcome);
    }

    fn cut_short(&self, requested: usize, waited: Duration) -> MatchTimeout {
        MatchTimeout {
            completed: self.outcomes.len(),
            requested,
            waited,
        }
    }

    /// Average scores `[candidate, opponent]` over collected matches
    pub fn avg_scores(&self) -> [f64; 2] {
        let n = self.outcomes.len();
        if n == 0 {
            [0.0, 0.0]
        } else {
            [self.total_scores[0] / n as f64, self.total_scores[1] / n as f64]
        }
    }

    /// Score differentials `candidate - opponent`, one per collected match
    pub fn differentials(&self) -> Vec<f64> {
        self.outcomes.iter().map(MatchOutcome::differential).collect()
    }

    pub fn timed_out(&self) -> bool {
        self.timeout.is_some()
    }
}

// ============================================================================
// Level 1 - Orchestration
// ============================================================================

/// Evaluate `candidate` against `opponent` over `config.num_matches` matches.
///
/// A fresh pool of `config.pool_size` workers runs the matches; results are
/// consumed in submission order. When any result takes longer than
/// `config.match_timeout`, or the simulator reports the match was killed at
/// its deadline, the remaining work is abandoned and the partial result is
/// returned with [`PairingResult::timeout`] set.
pub fn evaluate_pairing<R: Rng>(
    simulator: &Arc<dyn Simulator>,
    candidate: &Path,
    opponent: &Path,
    config: &EvalConfig,
    rng: &mut R,
    sink: &mut dyn ReportSink,
) -> Result<PairingResult> {
    tracing::info!(
        "Pairing vs {}: {} matches over {} workers",
        opponent.display(),
        config.num_matches,
        config.pool_size
    );

    let start = Instant::now();
    let pool = build_pool(config.pool_size)?;
    let cancelled = Arc::new(AtomicBool::new(false));

    let seeds = draw_seeds(rng, config.num_matches, simulator.max_seed());
    let pending = submit_matches(&pool, simulator, candidate, opponent, &seeds, &cancelled);

    let mut progress = ProgressBar::start(sink, opponent, config.num_matches)?;
    let collected = collect_results(&pending, opponent, config, &mut progress);

    // Stop queued matches from starting
    cancelled.store(true, Ordering::SeqCst);
    match &collected {
        // Every match has reported; wait for each worker to leave its job
        Ok(result) if result.timeout.is_none() => {
            pool.broadcast(|_| ());
        }
        // Rayon cannot interrupt a running job, so an in-flight match keeps its
        // worker alive after the drop until the simulator returns
        _ => {}
    }
    drop(pool);

    let mut result = match collected {
        Ok(result) => result,
        Err(err) => {
            progress.abort()?;
            return Err(err);
        }
    };
    result.elapsed = start.elapsed();

    match result.timeout {
        Some(timeout) => {
            tracing::warn!(
                "Pairing vs {} timed out after {}/{} matches",
                opponent.display(),
                timeout.completed,
                timeout.requested
            );
            progress.finish_timed_out(&result)?;
        }
        None => progress.finish(&result)?,
    }

    Ok(result)
}

/// Play one match. This is the unit of work dispatched to the worker pool.
pub fn run_match(
    simulator: &dyn Simulator,
    artifact_a: &Path,
    artifact_b: &Path,
    seed: u64,
) -> Result<MatchOutcome> {
    let outcome = simulator.run_match(artifact_a, artifact_b, seed)?;
    tracing::debug!(
        "Match seed={} -> {} : {}",
        seed,
        outcome.score_a,
        outcome.score_b
    );
    Ok(outcome)
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

type PendingMatch = Receiver<Result<MatchOutcome>>;

/// Queue every match on the pool, one result channel per match
fn submit_matches(
    pool: &ThreadPool,
    simulator: &Arc<dyn Simulator>,
    candidate: &Path,
    opponent: &Path,
    seeds: &[u64],
    cancelled: &Arc<AtomicBool>,
) -> Vec<PendingMatch> {
    seeds
        .iter()
        .map(|&seed| {
            let (tx, rx) = crossbeam_channel::bounded(1);
            let simulator = Arc::clone(simulator);
            let cancelled = Arc::clone(cancelled);
            let candidate = candidate.to_path_buf();
            let opponent = opponent.to_path_buf();

            pool.spawn(move || {
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                // The receiver is gone once the pairing has been abandoned
                let _ = tx.send(run_match(simulator.as_ref(), &candidate, &opponent, seed));
            });

            rx
        })
        .collect()
}

/// Wait for each result in submission order
fn collect_results(
    pending: &[PendingMatch],
    opponent: &Path,
    config: &EvalConfig,
    progress: &mut ProgressBar<'_>,
) -> Result<PairingResult> {
    let mut result = PairingResult::new(opponent, pending.len());

    for (index, rx) in pending.iter().enumerate() {
        match rx.recv_timeout(config.match_timeout) {
            Ok(Ok(outcome)) => {
                result.record(outcome);
                progress.advance(result.outcomes.len())?;
            }
            Ok(Err(TuneError::MatchKilled { after })) => {
                result.timeout = Some(result.cut_short(pending.len(), after));
                break;
            }
            Ok(Err(err)) => return Err(err),
            Err(RecvTimeoutError::Timeout) => {
                result.timeout = Some(result.cut_short(pending.len(), config.match_timeout));
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TuneError::Simulator(format!(
                    "match {} ended without a result",
                    index + 1
                )));
            }
        }
    }

    Ok(result)
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

fn build_pool(pool_size: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(pool_size.max(1))
        .thread_name(|i| format!("match-worker-{}", i))
        .panic_handler(|_| tracing::error!("Match worker panicked"))
        .build()
        .map_err(|e| TuneError::WorkerPool(e.to_string()))
}

fn draw_seeds<R: Rng>(rng: &mut R, count: usize, max_seed: u64) -> Vec<u64> {
    (0..count).map(|_| rng.gen_range(0..=max_seed)).collect()
}

/// Ten-cell progress bar written to the report sink, one line per pairing
struct ProgressBar<'a> {
    sink: &'a mut dyn ReportSink,
    requested: usize,
    cells: usize,
}

impl<'a> ProgressBar<'a> {
    fn start(sink: &'a mut dyn ReportSink, opponent: &Path, requested: usize) -> Result<Self> {
        sink.write(&format!("{:>20} - {:>3}: [", artifact_label(opponent), requested))?;
        sink.flush()?;
        Ok(Self {
            sink,
            requested,
            cells: 0,
        })
    }

    /// At most one cell per completed match
    fn advance(&mut self, completed: usize) -> Result<()> {
        if self.requested > 0 && completed * PROGRESS_CELLS / self.requested > self.cells {
            self.cells += 1;
            self.sink.write(".")?;
            self.sink.flush()?;
        }
        Ok(())
    }

    fn finish(&mut self, result: &PairingResult) -> Result<()> {
        let diff = match mean_std(&result.differentials()) {
            Ok((avg, std)) => format!("diff {:5.1} std {:4.1}", avg, std),
            Err(_) => "diff   n/a".to_string(),
        };
        let line = format!(
            "{}] - {:>12} by {:>12} {} in {:5.1}s",
            " ".repeat(PROGRESS_CELLS - self.cells),
            result.tally.to_string(),
            format_scores(result.avg_scores()),
            diff,
            result.elapsed.as_secs_f64()
        );
        self.sink.write_line(&line)?;
        Ok(())
    }

    fn finish_timed_out(&mut self, result: &PairingResult) -> Result<()> {
        let line = format!(
            "{}] - {:>12} by {:>12} in {:5.1}s",
            "x".repeat(PROGRESS_CELLS - self.cells),
            result.tally.to_string(),
            format_scores(result.avg_scores()),
            result.elapsed.as_secs_f64()
        );
        self.sink.write_line(&line)?;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.sink.write_line("]")?;
        Ok(())
    }
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// File stem of an artifact, for progress output
fn artifact_label(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_scores(scores: [f64; 2]) -> String {
    format!("[{:.1}, {:.1}]", scores[0], scores[1])
}
