//! The shared status record and its typed views.

use std::fmt;

/// Part count assumed when `TOTAL_PARTS` is missing or unparseable.
pub const DEFAULT_TOTAL_PARTS: u32 = 8;

/// Keys the monitor interprets. Any other key is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKey {
    Mode,
    Stage,
    Part,
    Step,
    StartTime,
    TotalParts,
    CompletedParts,
    CurrentConstraints,
    PeakMemory,
    Errors,
    Warnings,
    LogFile,
}

impl StatusKey {
    /// All known keys, in the order a fresh record lists them.
    pub const ALL: [Self; 12] = [
        Self::Mode,
        Self::Stage,
        Self::Part,
        Self::Step,
        Self::StartTime,
        Self::TotalParts,
        Self::CompletedParts,
        Self::CurrentConstraints,
        Self::PeakMemory,
        Self::Errors,
        Self::Warnings,
        Self::LogFile,
    ];

    /// The on-disk spelling of this key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mode => "MODE",
            Self::Stage => "STAGE",
            Self::Part => "PART",
            Self::Step => "STEP",
            Self::StartTime => "START_TIME",
            Self::TotalParts => "TOTAL_PARTS",
            Self::CompletedParts => "COMPLETED_PARTS",
            Self::CurrentConstraints => "CURRENT_CONSTRAINTS",
            Self::PeakMemory => "PEAK_MEMORY",
            Self::Errors => "ERRORS",
            Self::Warnings => "WARNINGS",
            Self::LogFile => "LOG_FILE",
        }
    }

    /// Look up a key by its on-disk spelling.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse phase of the monitored build.
///
/// The set is open-ended: a value written by some other tool is kept as
/// [`Stage::Other`] and displayed verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Idle,
    Initializing,
    Starting,
    Compiling,
    Witness,
    TrustedSetup,
    Proving,
    Complete,
    Other(String),
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => "idle",
            Self::Initializing => "initializing",
            Self::Starting => "starting",
            Self::Compiling => "compiling",
            Self::Witness => "witness",
            Self::TrustedSetup => "trusted_setup",
            Self::Proving => "proving",
            Self::Complete => "complete",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a stored stage value. An empty value reads as [`Stage::Idle`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "idle" => Self::Idle,
            "initializing" => Self::Initializing,
            "starting" => Self::Starting,
            "compiling" => Self::Compiling,
            "witness" => Self::Witness,
            "trusted_setup" => Self::TrustedSetup,
            "proving" => Self::Proving,
            "complete" => Self::Complete,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether the build is somewhere between start and completion.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle | Self::Complete)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of build progress as stored in the status file.
///
/// Entries keep their insertion order so a read followed by a write
/// reproduces the file byte for byte. Typed accessors never fail: a
/// missing or malformed value reads as the field's default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRecord {
    entries: Vec<(String, String)>,
}

impl StatusRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `key=value` lines. Lines without `=` are skipped.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut record = Self::new();
        for line in content.lines() {
            let line = line.trim();
            if let Some((key, value)) = line.split_once('=') {
                record.set_raw(key, value);
            }
        }
        record
    }

    /// Serialize as one `key=value` line per entry.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over raw entries, known and unknown keys alike.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, replacing in place when the key is already present.
    pub fn set_raw(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    #[must_use]
    pub fn get(&self, key: StatusKey) -> Option<&str> {
        self.get_raw(key.as_str())
    }

    pub fn set(&mut self, key: StatusKey, value: impl Into<String>) {
        self.set_raw(key.as_str(), value);
    }

    /// Value of `key`, or the empty string.
    #[must_use]
    pub fn text(&self, key: StatusKey) -> &str {
        self.get(key).unwrap_or("")
    }

    fn parsed<T: std::str::FromStr>(&self, key: StatusKey) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    #[must_use]
    pub fn mode(&self) -> &str {
        self.text(StatusKey::Mode)
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        Stage::parse(self.text(StatusKey::Stage))
    }

    #[must_use]
    pub fn part(&self) -> &str {
        self.text(StatusKey::Part)
    }

    #[must_use]
    pub fn step(&self) -> &str {
        self.text(StatusKey::Step)
    }

    /// Unix seconds at which the run started, or 0.
    #[must_use]
    pub fn start_time(&self) -> i64 {
        self.parsed::<i64>(StatusKey::StartTime)
            .filter(|t| *t > 0)
            .unwrap_or(0)
    }

    #[must_use]
    pub fn total_parts(&self) -> u32 {
        self.parsed(StatusKey::TotalParts)
            .unwrap_or(DEFAULT_TOTAL_PARTS)
    }

    #[must_use]
    pub fn completed_parts(&self) -> u32 {
        self.parsed(StatusKey::CompletedParts).unwrap_or(0)
    }

    #[must_use]
    pub fn current_constraints(&self) -> u64 {
        self.parsed(StatusKey::CurrentConstraints).unwrap_or(0)
    }

    /// Peak memory in GB. Negative or non-finite values read as 0.
    #[must_use]
    pub fn peak_memory(&self) -> f64 {
        self.parsed::<f64>(StatusKey::PeakMemory)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }

    #[must_use]
    pub fn errors(&self) -> u32 {
        self.parsed(StatusKey::Errors).unwrap_or(0)
    }

    #[must_use]
    pub fn warnings(&self) -> u32 {
        self.parsed(StatusKey::Warnings).unwrap_or(0)
    }

    #[must_use]
    pub fn log_file(&self) -> &str {
        self.text(StatusKey::LogFile)
    }
}
