//! Variant materialization - configuration copies with substituted values

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{Result, TuneError};

/// One variable bound to a concrete value
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assignment {
    pub name: String,
    pub value: f64,
}

impl Assignment {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A materialized candidate configuration.
///
/// Backed by a uniquely named temporary file next to the base configuration;
/// the file is removed when the artifact is dropped.
#[derive(Debug)]
pub struct CandidateArtifact {
    file: NamedTempFile,
}

impl CandidateArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Remove the backing file now, reporting any failure
    pub fn discard(self) -> Result<()> {
        self.file.close()?;
        Ok(())
    }
}

/// Format a value the way it is written back into a configuration
pub fn format_value(value: f64) -> String {
    // Debug formatting round-trips and always keeps a decimal point
    format!("{:?}", value)
}

/// Substitute `assignments` into `base`, returning the new text.
///
/// For each variable the first line containing its name as a whole
/// identifier is rewritten to `name = value`; `hp` does not match `max_hp`.
/// Every other line is copied byte for byte.
pub fn materialize_text(base: &str, assignments: &[Assignment]) -> Result<String> {
    let mut lines: Vec<String> = base.split_inclusive('\n').map(str::to_string).collect();

    for assignment in assignments {
        let idx = lines
            .iter()
            .position(|line| contains_word(line, &assignment.name))
            .ok_or_else(|| {
                TuneError::config(format!("variable '{}' not found", assignment.name))
            })?;

        let rewritten = rewrite_line(&lines[idx], assignment).ok_or_else(|| {
            TuneError::at_line(
                idx + 1,
                format!("first mention of '{}' is not an assignment", assignment.name),
            )
        })?;
        lines[idx] = rewritten;
    }

    Ok(lines.concat())
}

/// Write a variant of the configuration at `base_path` to a fresh temporary file
pub fn materialize(base_path: &Path, assignments: &[Assignment]) -> Result<CandidateArtifact> {
    let base = std::fs::read_to_string(base_path)?;
    let text = materialize_text(&base, assignments)?;

    let (prefix, suffix) = artifact_affixes(base_path);
    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(&suffix)
        .tempfile_in(artifact_dir(base_path))?;
    file.write_all(text.as_bytes())?;
    file.flush()?;

    tracing::debug!("Materialized {}", file.path().display());

    Ok(CandidateArtifact { file })
}

/// Rewrite the configuration at `base_path` itself with `assignments`
pub fn persist_in_place(base_path: &Path, assignments: &[Assignment]) -> Result<()> {
    let base = std::fs::read_to_string(base_path)?;
    let text = materialize_text(&base, assignments)?;
    std::fs::write(base_path, text)?;
    Ok(())
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// Rewrite `line` as an assignment of the new value, keeping indentation and terminator
fn rewrite_line(line: &str, assignment: &Assignment) -> Option<String> {
    let eq = line.find('=')?;
    let terminator = if line.ends_with("\r\n") {
        "\r\n"
    } else if line.ends_with('\n') {
        "\n"
    } else {
        ""
    };
    let indent_len = line.len() - line.trim_start().len();
    let indent = &line[..indent_len.min(eq)];

    Some(format!(
        "{}{} = {}{}",
        indent,
        assignment.name,
        format_value(assignment.value),
        terminator
    ))
}

/// True when `name` occurs in `line` as a whole identifier
fn contains_word(line: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';

    line.match_indices(name).any(|(start, _)| {
        let before = line[..start].chars().next_back();
        let after = line[start + name.len()..].chars().next();
        !before.map_or(false, is_ident) && !after.map_or(false, is_ident)
    })
}

fn artifact_dir(base_path: &Path) -> PathBuf {
    match base_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn artifact_affixes(base_path: &Path) -> (String, String) {
    let stem = base_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "candidate".to_string());
    let suffix = base_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    (format!(".sweeptune-{}-", stem), suffix)
}
