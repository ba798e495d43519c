//! Error taxonomy for sweeps

use std::path::PathBuf;

/// Errors raised while parsing, materializing or evaluating a sweep
#[derive(Debug, thiserror::Error)]
pub enum TuneError {
    #[error("configuration error{}: {message}", line_suffix(.line))]
    Configuration {
        /// 1-based line number, when the error is tied to a line
        line: Option<usize>,
        message: String,
    },

    #[error("missing opponent artifact: {}", .0.display())]
    MissingOpponent(PathBuf),

    #[error("degenerate statistics: {samples} sample(s), need at least 2")]
    DegenerateStatistics { samples: usize },

    #[error("simulator failed: {0}")]
    Simulator(String),

    /// A match ran past its kill deadline and was stopped
    #[error("match killed after {:.1}s", .after.as_secs_f64())]
    MatchKilled { after: std::time::Duration },

    #[error("worker pool failed: {0}")]
    WorkerPool(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TuneError {
    /// Configuration error tied to a 1-based line number
    pub fn at_line(line: usize, message: impl Into<String>) -> Self {
        TuneError::Configuration {
            line: Some(line),
            message: message.into(),
        }
    }

    /// Configuration error without a line
    pub fn config(message: impl Into<String>) -> Self {
        TuneError::Configuration {
            line: None,
            message: message.into(),
        }
    }

    /// True for errors that abort before any simulation starts
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TuneError::Configuration { .. } | TuneError::MissingOpponent(_)
        )
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" on line {}", n),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, TuneError>;
