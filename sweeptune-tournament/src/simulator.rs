//! Simulator contract - the opaque service that plays one match
//!
//! Level 3 - Step-level implementation

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use sweeptune_core::{Result, TuneError};

/// Largest seed accepted when a simulator does not say otherwise
pub const DEFAULT_MAX_SEED: u64 = 2_147_483_647;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Scores of one match, from the first competitor's point of view
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub score_a: f64,
    pub score_b: f64,
}

/// Result of a match for the first competitor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Loss,
    Draw,
}

impl MatchOutcome {
    pub fn new(score_a: f64, score_b: f64) -> Self {
        Self { score_a, score_b }
    }

    /// Signed score difference `score_a - score_b`
    pub fn differential(&self) -> f64 {
        self.score_a - self.score_b
    }

    pub fn verdict(&self) -> Verdict {
        if self.score_a > self.score_b {
            Verdict::Win
        } else if self.score_a < self.score_b {
            Verdict::Loss
        } else {
            Verdict::Draw
        }
    }
}

/// Plays a single match between two competitor artifacts.
///
/// Implementations are shared by every worker of a pool, so calls must not
/// depend on mutable shared state.
pub trait Simulator: Send + Sync {
    fn run_match(&self, artifact_a: &Path, artifact_b: &Path, seed: u64) -> Result<MatchOutcome>;

    /// Largest valid seed (inclusive)
    fn max_seed(&self) -> u64 {
        DEFAULT_MAX_SEED
    }
}

/// Simulator backed by an external program.
///
/// Runs `PROGRAM [ARGS...] <artifact_a> <artifact_b> <seed>` and reads the
/// two scores from the last non-empty line of its standard output.
#[derive(Clone, Debug)]
pub struct CommandSimulator {
    program: PathBuf,
    args: Vec<String>,
    max_seed: u64,
    kill_after: Option<Duration>,
}

impl CommandSimulator {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            max_seed: DEFAULT_MAX_SEED,
            kill_after: None,
        }
    }

    /// Extra arguments placed before the artifacts and seed
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_max_seed(mut self, max_seed: u64) -> Self {
        self.max_seed = max_seed;
        self
    }

    /// Kill the child process when a match runs longer than `limit`
    pub fn with_kill_after(mut self, limit: Duration) -> Self {
        self.kill_after = Some(limit);
        self
    }

    fn spawn(&self, artifact_a: &Path, artifact_b: &Path, seed: u64) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .arg(artifact_a)
            .arg(artifact_b)
            .arg(seed.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TuneError::Simulator(format!("failed to start {}: {}", self.program.display(), e))
            })
    }

    /// Wait for the child, killing it once the deadline passes
    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(limit) = self.kill_after else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + limit;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(TuneError::MatchKilled { after: limit });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Simulator for CommandSimulator {
    fn run_match(&self, artifact_a: &Path, artifact_b: &Path, seed: u64) -> Result<MatchOutcome> {
        let mut child = self.spawn(artifact_a, artifact_b, seed)?;

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || read_pipe(stdout));
        let stderr_reader = thread::spawn(move || read_pipe(stderr));

        let status = self.wait(&mut child)?;
        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(TuneError::Simulator(format!(
                "{} exited with {}: {}",
                self.program.display(),
                status,
                stderr.trim()
            )));
        }

        parse_scores(&stdout)
    }

    fn max_seed(&self) -> u64 {
        self.max_seed
    }
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

fn read_pipe<R: Read>(pipe: Option<R>) -> String {
    let mut text = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut text);
    }
    text
}

/// Parse `scoreA scoreB` (whitespace or comma separated) from the last non-empty line
fn parse_scores(stdout: &str) -> Result<MatchOutcome> {
    let line = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| TuneError::Simulator("simulator printed no scores".to_string()))?;

    let scores: Vec<f64> = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.trim_matches(|c| c == '[' || c == ']' || c == '(' || c == ')'))
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>)
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| TuneError::Simulator(format!("unparseable scores: '{}'", line)))?;

    match scores.as_slice() {
        [a, b] => Ok(MatchOutcome::new(*a, *b)),
        _ => Err(TuneError::Simulator(format!(
            "expected two scores, got '{}'",
            line
        ))),
    }
}
