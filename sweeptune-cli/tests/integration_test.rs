//! Integration tests for sweeptune
//!
//! Tests the full stack: directive parsing, trial enumeration, parallel
//! pairings, ranking and persistence, in-process and through the binary

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use sweeptune_core::{parse_directives, Directives, MemorySink, Result, TuneError};
use sweeptune_optimize::{optimize, run_sweep, OptimizeConfig};
use sweeptune_tournament::{MatchOutcome, Simulator};

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Scores a configuration by how close `hp` and `speed` are to 12 and 3
#[derive(Default)]
struct TargetSimulator {
    opponents: Mutex<Vec<PathBuf>>,
}

fn read_var(path: &Path, name: &str) -> f64 {
    let text = std::fs::read_to_string(path).unwrap();
    text.lines()
        .filter_map(|l| l.split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().parse().unwrap())
        .unwrap()
}

fn fitness(path: &Path) -> f64 {
    100.0 - (read_var(path, "hp") - 12.0).powi(2) - (read_var(path, "speed") - 3.0).powi(2)
}

impl Simulator for TargetSimulator {
    fn run_match(&self, a: &Path, b: &Path, seed: u64) -> Result<MatchOutcome> {
        self.opponents.lock().unwrap().push(b.to_path_buf());
        let jitter = (seed % 4) as f64 * 0.01;
        Ok(MatchOutcome::new(fitness(a) + jitter, fitness(b)))
    }

    fn max_seed(&self) -> u64 {
        10_000
    }
}

const ROBOT: &str = "\
# robot parameters
#optimize = list: 8, 12, 16
hp = 10
#optimize = addsteps: 1, 3
speed = 2
name = 'liquid'
";

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn config() -> OptimizeConfig {
    OptimizeConfig::default().with_pool_size(3).with_seed(11)
}

// ============================================================================
// FULL STACK (in-process)
// ============================================================================

#[test]
fn test_two_variable_sweep_against_opponents() {
    let dir = tempfile::tempdir().unwrap();
    let liquid = write(dir.path(), "liquid.py", "hp = 10\nspeed = 2\n");
    let solid = write(dir.path(), "solid.py", "hp = 14\nspeed = 4\n");
    let text = format!(
        "#enemy_file = {}\n#enemy_file = {}\n#num_matches = 6\n{}",
        liquid.display(),
        solid.display(),
        ROBOT
    );
    let base = write(dir.path(), "robot.py", &text);
    let simulator = Arc::new(TargetSimulator::default());
    let mut sink = MemorySink::new();

    let directives = Directives::load(&base).unwrap();
    let report = optimize(&base, &directives, simulator.clone(), &config(), &mut sink).unwrap();

    // 3 hp values * 3 speed values
    assert_eq!(report.total_trials, 9);
    assert_eq!(report.ranked.len(), 9);
    assert_eq!(report.variables, vec!["hp", "speed"]);
    assert_eq!(report.best().unwrap().values, vec![12.0, 3.0]);
    for pair in report.ranked.windows(2) {
        assert!(pair[0].mean >= pair[1].mean);
    }
    for stat in &report.ranked {
        assert_eq!(stat.matches, 12);
        assert_eq!(stat.tally.total(), 12);
        assert!(!stat.timed_out);
    }

    let opponents = simulator.opponents.lock().unwrap();
    assert_eq!(opponents.len(), 9 * 2 * 6);
    assert_eq!(opponents.iter().filter(|p| **p == liquid).count(), 54);
    assert_eq!(opponents.iter().filter(|p| **p == solid).count(), 54);

    assert!(sink.contents().contains("Running 3*3 = 9 test cases of 6 matches (108 total)"));
    assert_eq!(std::fs::read_to_string(&base).unwrap(), text);
}

#[test]
fn test_run_sweep_persists_optimum() {
    let dir = tempfile::tempdir().unwrap();
    let text = format!("#save_optimum = 1\n#num_matches = 4\n{}", ROBOT);
    let base = write(dir.path(), "robot.py", &text);

    let report = run_sweep(&base, Arc::new(TargetSimulator::default()), &config()).unwrap();

    assert!(report.persisted);
    let saved = std::fs::read_to_string(&base).unwrap();
    let expected = text
        .replace("hp = 10\n", "hp = 12.0\n")
        .replace("speed = 2\n", "speed = 3.0\n");
    assert_eq!(saved, expected);

    // Only the base survives; every candidate artifact was reclaimed
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    // The rewritten file still parses to the same sweep
    let reparsed = parse_directives(&saved, &base).unwrap();
    assert_eq!(reparsed.rules[0].original, 12.0);
    assert_eq!(reparsed.rules[1].original, 3.0);
}

#[test]
fn test_missing_opponent_is_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let text = format!("#enemy_file = {}\n{}", dir.path().join("gone.py").display(), ROBOT);
    let base = write(dir.path(), "robot.py", &text);

    let err = run_sweep(&base, Arc::new(TargetSimulator::default()), &config()).unwrap_err();
    assert!(matches!(err, TuneError::MissingOpponent(_)));
    assert!(err.is_configuration());
}

// ============================================================================
// BINARY
// ============================================================================

/// Shell simulator: reads `x` from both artifacts, prints `scoreA scoreB`
#[cfg(unix)]
const SH_SIMULATOR: &str = r#"awk -v s="$3" 'FNR==1{f++} /^x = /{x[f]=$3} END{print 20-(x[1]-2)^2+(s%3)*0.1, 20-(x[2]-2)^2}' "$1" "$2""#;

fn sweeptune() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sweeptune"))
}

#[cfg(unix)]
#[test]
fn test_binary_sweeps_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(
        dir.path(),
        "bot.py",
        "#save_optimum = 1\n#num_matches = 4\n#optimize = list: 1, 2, 3\nx = 5.0\n",
    );
    let json = dir.path().join("results.json");

    let output = sweeptune()
        .arg(&base)
        .args(["-p", "2", "--seed", "3", "--simulator", "sh"])
        .args(["--simulator-arg", "-c", "--simulator-arg", SH_SIMULATOR])
        .args(["--simulator-arg", "sim"])
        .arg("--json-out")
        .arg(&json)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Starting optimization at "));
    assert!(stdout.contains("Best Result:"));
    assert!(stdout.contains("Saved best result to"));

    let saved = std::fs::read_to_string(&base).unwrap();
    assert!(saved.ends_with("x = 2.0\n"));

    let results: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(results["total_trials"], 3);
    assert_eq!(results["ranked"].as_array().unwrap().len(), 3);
    assert_eq!(results["ranked"][0]["values"][0], 2.0);
    assert_eq!(results["persisted"], true);
}

#[test]
fn test_binary_missing_file_does_nothing() {
    let output = sweeptune()
        .args(["/no/such/bot.py", "--simulator", "sh"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_binary_reports_bad_directive_line() {
    let dir = tempfile::tempdir().unwrap();
    let base = write(dir.path(), "bot.py", "x = 1\n#optimize = random: 1, 2\ny = 2\n");

    let output = sweeptune()
        .arg(&base)
        .args(["--simulator", "sh"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{}", stderr);
    assert!(output.stdout.is_empty());
}
