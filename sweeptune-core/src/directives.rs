//! Directive parsing - which variables to sweep and how to run the sweep
//!
//! Directives are comment lines of the form `#key = value`. An `optimize`
//! directive annotates the assignment on the line right after it:
//!
//! ```text
//! #optimize = list: 8, 10, 12
//! minimum_hp = 10
//! #optimize = multsteps: 2, 5
//! bad_guy_score = 20
//! #enemy_file = ./robot_library/liquid.py
//! #num_matches = 25
//! #log_file = logfile.txt
//! #save_optimum = 1
//! ```

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::{Result, TuneError};
use crate::values::SweepKind;

const DEFAULT_NUM_MATCHES: usize = 25;

/// Largest step or match count a directive may ask for
const MAX_COUNT: f64 = u32::MAX as f64;

/// One variable marked for sweeping
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepRule {
    /// Variable name (text before the assignment operator)
    pub name: String,
    /// Value currently assigned in the base configuration
    pub original: f64,
    /// Generation rule
    pub kind: SweepKind,
    /// 1-based line of the annotated assignment
    pub line: usize,
}

impl SweepRule {
    /// Ordered candidate values; never empty
    pub fn candidates(&self) -> Vec<f64> {
        self.kind.candidates(self.original)
    }
}

/// A scalar directive value: numeric when it parses as one, text otherwise
#[derive(Clone, Debug, PartialEq)]
pub enum ScalarValue {
    Number(f64),
    Text(String),
}

impl ScalarValue {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<f64>() {
            Ok(n) => ScalarValue::Number(n),
            Err(_) => ScalarValue::Text(trimmed.to_string()),
        }
    }

    /// Non-zero numbers and non-empty text are true
    pub fn is_truthy(&self) -> bool {
        match self {
            ScalarValue::Number(n) => *n != 0.0,
            ScalarValue::Text(t) => !t.is_empty(),
        }
    }
}

/// Scalar run settings
#[derive(Clone, Debug, PartialEq)]
pub struct RunOptions {
    /// Matches per candidate/opponent pairing
    pub num_matches: usize,
    /// Where to duplicate the report stream
    pub log_file: Option<PathBuf>,
    /// Rewrite the base configuration with the best values
    pub save_optimum: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            num_matches: DEFAULT_NUM_MATCHES,
            log_file: None,
            save_optimum: false,
        }
    }
}

impl RunOptions {
    pub fn with_num_matches(mut self, num_matches: usize) -> Self {
        self.num_matches = num_matches;
        self
    }

    pub fn with_save_optimum(mut self, save_optimum: bool) -> Self {
        self.save_optimum = save_optimum;
        self
    }
}

/// Everything the directives of one configuration declare
#[derive(Clone, Debug)]
pub struct Directives {
    /// Swept variables in declaration order
    pub rules: Vec<SweepRule>,
    /// Opponent artifacts; the base itself when none are declared
    pub opponents: Vec<PathBuf>,
    pub options: RunOptions,
}

impl Directives {
    /// Read and parse a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        parse_directives(&text, path)
    }

    /// Candidate values of every rule, in declaration order
    pub fn candidate_ranges(&self) -> Vec<Vec<f64>> {
        self.rules.iter().map(SweepRule::candidates).collect()
    }

    /// Swept variable names in declaration order
    pub fn variable_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }
}

// ============================================================================
// Level 1 - Parsing
// ============================================================================

/// Parse the directives of `text`, the content of the configuration at `base_path`
pub fn parse_directives(text: &str, base_path: &Path) -> Result<Directives> {
    let lines: Vec<&str> = text.lines().collect();
    let mut rules = Vec::new();
    let mut opponents = Vec::new();
    let mut options = RunOptions::default();
    let mut seen = FxHashSet::default();

    for (idx, line) in lines.iter().enumerate() {
        let Some((key, value)) = split_directive(line) else {
            continue;
        };
        let line_no = idx + 1;

        match key {
            "optimize" => {
                let rule = parse_optimize(value, line_no, lines.get(idx + 1).copied())?;
                if !seen.insert(rule.name.clone()) {
                    return Err(TuneError::at_line(
                        rule.line,
                        format!("variable '{}' is swept more than once", rule.name),
                    ));
                }
                rules.push(rule);
            }
            "enemy_file" => opponents.push(parse_opponent(value)?),
            "num_matches" => options.num_matches = parse_num_matches(value, line_no)?,
            "log_file" => {
                let path = value.trim();
                if !path.is_empty() {
                    options.log_file = Some(PathBuf::from(path));
                }
            }
            "save_optimum" => options.save_optimum = ScalarValue::parse(value).is_truthy(),
            _ => {}
        }
    }

    if opponents.is_empty() {
        opponents.push(base_path.to_path_buf());
    }

    tracing::info!(
        "Parsed {} swept variable(s), {} opponent(s), {} matches per pairing",
        rules.len(),
        opponents.len(),
        options.num_matches
    );

    Ok(Directives {
        rules,
        opponents,
        options,
    })
}

// ============================================================================
// Level 2 - Directive families
// ============================================================================

/// Parse an `optimize` directive body and the assignment that follows it
fn parse_optimize(body: &str, line_no: usize, next_line: Option<&str>) -> Result<SweepRule> {
    let target_no = line_no + 1;
    let next_line = next_line.ok_or_else(|| {
        TuneError::at_line(line_no, "optimize directive is not followed by an assignment")
    })?;

    let (name, original) = split_assignment(next_line)
        .ok_or_else(|| TuneError::at_line(target_no, "expected an assignment after optimize directive"))?;
    if name.is_empty() {
        return Err(TuneError::at_line(target_no, "assignment has no variable name"));
    }
    let original = original.trim().parse::<f64>().map_err(|_| {
        TuneError::at_line(
            target_no,
            format!("value of '{}' is not numeric: '{}'", name, original.trim()),
        )
    })?;

    let kind = parse_sweep_kind(body, line_no)?;

    Ok(SweepRule {
        name: name.to_string(),
        original,
        kind,
        line: target_no,
    })
}

/// Parse `list: a, b, ...`, `multsteps: factor, count` or `addsteps: delta, count`
fn parse_sweep_kind(body: &str, line_no: usize) -> Result<SweepKind> {
    let no_options = || TuneError::at_line(line_no, "no optimization options given");

    let (keyword, params) = body.split_once(':').ok_or_else(no_options)?;
    let params = parse_numbers(params, line_no)?;

    match keyword.trim() {
        "list" => {
            if params.is_empty() {
                return Err(TuneError::at_line(line_no, "list sweep has no values"));
            }
            Ok(SweepKind::List { values: params })
        }
        "multsteps" => {
            let (factor, count) = step_params(&params, "multsteps", line_no)?;
            Ok(SweepKind::MultSteps { factor, count })
        }
        "addsteps" => {
            let (delta, count) = step_params(&params, "addsteps", line_no)?;
            Ok(SweepKind::AddSteps { delta, count })
        }
        _ => Err(no_options()),
    }
}

/// Check that an opponent artifact exists
fn parse_opponent(value: &str) -> Result<PathBuf> {
    let path = PathBuf::from(value.trim());
    if path.is_file() {
        Ok(path)
    } else {
        Err(TuneError::MissingOpponent(path))
    }
}

fn parse_num_matches(value: &str, line_no: usize) -> Result<usize> {
    match ScalarValue::parse(value) {
        // Fractional counts truncate
        ScalarValue::Number(n) if (1.0..=MAX_COUNT).contains(&n) => Ok(n as usize),
        ScalarValue::Number(n) => Err(TuneError::at_line(
            line_no,
            format!("num_matches must be between 1 and {}, got {}", MAX_COUNT, n),
        )),
        ScalarValue::Text(t) => Err(TuneError::at_line(
            line_no,
            format!("num_matches is not numeric: '{}'", t),
        )),
    }
}

// ============================================================================
// Level 3 - Line utilities
// ============================================================================

/// Split `#key = value` into its trimmed key and raw value
fn split_directive(line: &str) -> Option<(&str, &str)> {
    let rest = line.trim_start().strip_prefix('#')?;
    let (key, value) = rest.split_once('=')?;
    Some((key.trim(), value))
}

/// Split `name = value` into its trimmed name and raw value
pub(crate) fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once('=')?;
    Some((name.trim(), value))
}

fn parse_numbers(params: &str, line_no: usize) -> Result<Vec<f64>> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<f64>()
                .map_err(|_| TuneError::at_line(line_no, format!("'{}' is not a number", p)))
        })
        .collect()
}

fn step_params(params: &[f64], keyword: &str, line_no: usize) -> Result<(f64, usize)> {
    match params {
        [_, count] if !count.is_finite() || *count > MAX_COUNT => Err(TuneError::at_line(
            line_no,
            format!("{} step count {} is out of range", keyword, count),
        )),
        // Counts truncate like an integer conversion; negatives collapse to a single step
        [amount, count] => Ok((*amount, count.max(0.0) as usize)),
        _ => Err(TuneError::at_line(
            line_no,
            format!("{} expects two parameters, got {}", keyword, params.len()),
        )),
    }
}
