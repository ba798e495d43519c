//! Reporting sinks - where progress and results are written
//!
//! The sweep never writes to a process-wide stream directly; it is handed a
//! sink, which is either a pass-through to stdout or a tee into a log file.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Destination for human-facing report text
pub trait ReportSink {
    /// Write `text` as-is (used for partial lines such as progress bars)
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Write `text` followed by a newline
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.write(text)?;
        self.write("\n")
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Pass-through to standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn write(&mut self, text: &str) -> io::Result<()> {
        io::stdout().write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Standard output duplicated into an appended log file
#[derive(Debug)]
pub struct TeeSink {
    log: File,
}

impl TeeSink {
    /// Open `path` for appending, creating it if needed
    pub fn open(path: &Path) -> io::Result<Self> {
        let log = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { log })
    }
}

impl ReportSink for TeeSink {
    fn write(&mut self, text: &str) -> io::Result<()> {
        io::stdout().write_all(text.as_bytes())?;
        self.log.write_all(text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        self.log.flush()
    }
}

/// In-memory sink, mostly for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: String,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.lines().collect()
    }
}

impl ReportSink for MemorySink {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.buffer.push_str(text);
        Ok(())
    }
}

/// Pass-through sink, or a tee when a log file is configured
pub fn open_sink(log_file: Option<&Path>) -> io::Result<Box<dyn ReportSink>> {
    match log_file {
        Some(path) => {
            tracing::info!("Duplicating report to {}", path.display());
            Ok(Box::new(TeeSink::open(path)?))
        }
        None => Ok(Box::new(StdoutSink)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects_lines() {
        let mut sink = MemorySink::new();
        sink.write("bar: [").unwrap();
        sink.write("..").unwrap();
        sink.write_line("]").unwrap();
        sink.write_line("done").unwrap();

        assert_eq!(sink.lines(), vec!["bar: [..]", "done"]);
    }

    #[test]
    fn test_tee_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "earlier\n").unwrap();

        {
            let mut sink = open_sink(Some(&path)).unwrap();
            sink.write_line("later").unwrap();
            sink.flush().unwrap();
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier\nlater\n");
    }
}
