//! Append-only history of supervised runs.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use chrono::{DateTime, Utc};

use crate::display::format_duration;

/// One finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub finished_at: DateTime<Utc>,
    pub mode: String,
    pub stage: String,
    /// `exit=<code>` or `signal=<n>`.
    pub exit: String,
    pub elapsed_secs: u64,
}

impl HistoryEntry {
    /// Render as a single history line.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} mode={} stage={} {} elapsed={}",
            self.finished_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.mode,
            self.stage,
            self.exit,
            format_duration(self.elapsed_secs)
        )
    }
}

/// Describe how a child exited, for history lines and logs.
#[must_use]
pub fn describe_exit(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("exit={code}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("signal={signal}");
        }
    }
    "exit=unknown".to_string()
}

/// History file handle.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. Failures are logged and dropped.
    pub fn append(&self, entry: &HistoryEntry) {
        let result = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut f| writeln!(f, "{}", entry.to_line()));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to append history");
        }
    }

    /// The last `n` lines, or `None` when there is no history file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn tail(&self, n: usize) -> io::Result<Option<Vec<String>>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(tail_lines(&content, n))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Last `n` lines of `content`, trailing whitespace removed.
#[must_use]
pub fn tail_lines(content: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..]
        .iter()
        .map(|l| l.trim_end().to_string())
        .collect()
}
