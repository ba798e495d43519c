//! sweeptune Core - Directive parsing and candidate materialization
//!
//! This crate provides the pure domain logic for constant sweeps:
//! - Directive parsing (which variables to sweep, opponents, run options)
//! - Candidate value generation (explicit lists, geometric and additive steps)
//! - Variant materialization (substituting values into a configuration copy)
//! - Error taxonomy shared by the whole workspace
//! - Reporting sinks for progress and result output

pub mod error;
pub mod values;
pub mod directives;
pub mod variant;
pub mod report;

// Re-exports for convenient access
pub use error::{Result, TuneError};
pub use values::{linspace, Linspace, SweepKind};
pub use directives::{parse_directives, Directives, RunOptions, ScalarValue, SweepRule};
pub use variant::{format_value, materialize, materialize_text, persist_in_place, Assignment, CandidateArtifact};
pub use report::{open_sink, MemorySink, ReportSink, StdoutSink, TeeSink};
