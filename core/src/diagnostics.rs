//! Best-effort diagnostic log
//!
//! Appends timestamped, human-readable lines to a local file so operators can
//! follow an OIDC login without touching the main log configuration. Write
//! failures are dropped and never change an authentication outcome.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

/// Destination for diagnostic lines
pub trait DiagnosticSink {
    fn record(&self, message: &str);
}

/// Sink that discards everything
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&self, _message: &str) {}
}

/// Append-only file sink
pub struct FileDiagnosticSink {
    path: PathBuf,
}

impl FileDiagnosticSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }
}

impl DiagnosticSink for FileDiagnosticSink {
    fn record(&self, message: &str) {
        let line = format_line(Local::now().naive_local(), message);
        let _ = self.append(&line);
    }
}

/// `[YYYY-MM-DD HH:MM:SS] message\n`
fn format_line(at: NaiveDateTime, message: &str) -> String {
    format!("[{}] {}\n", at.format("%Y-%m-%d %H:%M:%S"), message)
}

/// Build the sink selected by configuration
pub fn sink_for(path: Option<&str>) -> Box<dyn DiagnosticSink> {
    match path {
        Some(path) => Box::new(FileDiagnosticSink::new(path)),
        None => Box::new(NullSink),
    }
}
