//! File-backed status store shared by the supervisor and the dashboard.
//!
//! Every write replaces the whole file through a temp file and a rename,
//! so a reader never sees a half-written record. There is no locking:
//! concurrent read-modify-write cycles may lose an update, which the next
//! log line or metrics sample repairs.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::{StatusKey, StatusRecord};

/// Handle to the status file. Cheap to clone; holds only the paths.
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
    log_file: PathBuf,
}

impl StatusStore {
    /// Create a store backed by `path`. `log_file` is what `init` records
    /// as the build log location.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, log_file: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            log_file: log_file.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read the current record. Never fails: a missing or unreadable file
    /// yields an empty record.
    #[must_use]
    pub fn read(&self) -> StatusRecord {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => StatusRecord::parse(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => StatusRecord::new(),
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Status file unreadable");
                StatusRecord::new()
            }
        }
    }

    /// Replace the stored record. I/O failures are logged and dropped.
    pub fn write(&self, record: &StatusRecord) {
        if let Err(e) = self.try_write(record) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write status file");
        }
    }

    fn try_write(&self, record: &StatusRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, record.serialize())?;
        std::fs::rename(&tmp, &self.path).inspect_err(|_| {
            let _ = std::fs::remove_file(&tmp);
        })
    }

    /// Sibling temp file. The pid suffix keeps two writer processes from
    /// sharing one.
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }

    /// Set a single field. Not atomic with respect to other writers.
    pub fn update(&self, key: StatusKey, value: impl Into<String>) {
        let mut record = self.read();
        record.set(key, value);
        self.write(&record);
    }

    /// Start a fresh record for a new run.
    pub fn init(&self, mode: &str, total_parts: u32) -> StatusRecord {
        let mut record = StatusRecord::new();
        record.set(StatusKey::Mode, mode);
        record.set(StatusKey::Stage, "initializing");
        record.set(StatusKey::Part, "");
        record.set(StatusKey::Step, "");
        record.set(StatusKey::StartTime, Utc::now().timestamp().to_string());
        record.set(StatusKey::TotalParts, total_parts.to_string());
        record.set(StatusKey::CompletedParts, "0");
        record.set(StatusKey::CurrentConstraints, "0");
        record.set(StatusKey::PeakMemory, "0");
        record.set(StatusKey::Errors, "0");
        record.set(StatusKey::Warnings, "0");
        record.set(StatusKey::LogFile, self.log_file.display().to_string());
        self.write(&record);
        tracing::debug!(mode, total_parts, path = %self.path.display(), "Status record initialized");
        record
    }

    /// Raise `PEAK_MEMORY` to `mem_used_gb` if it is higher than the stored
    /// peak. Returns the peak after the call.
    pub fn track_peak_memory(&self, mem_used_gb: f64) -> f64 {
        let mut record = self.read();
        let peak = record.peak_memory();
        if mem_used_gb.is_finite() && mem_used_gb > peak {
            record.set(StatusKey::PeakMemory, format!("{mem_used_gb:.1}"));
            self.write(&record);
            return mem_used_gb;
        }
        peak
    }

    /// Delete the status file. A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file exists but cannot be removed.
    pub fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}
