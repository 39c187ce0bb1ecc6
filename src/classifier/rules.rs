//! Line rules for inferring build progress from raw output.
//!
//! Each rule is a predicate over one line plus an effect on the status
//! record. Rules know nothing about each other; several may fire on the
//! same line.

use regex::Regex;

use crate::status::{Stage, StatusKey, StatusRecord};

/// Error type for rule construction.
#[derive(thiserror::Error, Debug)]
pub enum RuleError {
    /// Invalid regex pattern.
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// A single pattern-to-effect mapping applied to one line of build output.
pub trait LineRule: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Whether this rule fires for `line`.
    fn matches(&self, line: &str) -> bool;

    /// Apply the rule's effect. Only called when [`LineRule::matches`]
    /// returned true.
    fn apply(&self, line: &str, record: &mut StatusRecord);
}

/// Marks the build as compiling and records the part being worked on.
///
/// Fires on any line mentioning "part". The first whitespace-delimited
/// token starting with `part` or `Part` becomes `PART`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartRule;

impl LineRule for PartRule {
    fn name(&self) -> &str {
        "part"
    }

    fn matches(&self, line: &str) -> bool {
        line.to_lowercase().contains("part")
    }

    fn apply(&self, line: &str, record: &mut StatusRecord) {
        record.set(StatusKey::Stage, Stage::Compiling.as_str());
        if let Some(token) = line
            .split_whitespace()
            .find(|w| w.starts_with("part") || w.starts_with("Part"))
        {
            record.set(StatusKey::Part, token);
        }
    }
}

/// Counts finished parts. Each matching line adds one to `COMPLETED_PARTS`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletedPartRule;

impl LineRule for CompletedPartRule {
    fn name(&self) -> &str {
        "completed"
    }

    fn matches(&self, line: &str) -> bool {
        line.to_lowercase().contains("compiled")
    }

    fn apply(&self, _line: &str, record: &mut StatusRecord) {
        let completed = record.completed_parts().saturating_add(1);
        record.set(StatusKey::CompletedParts, completed.to_string());
    }
}

/// Copies the first capture group of a regex into a status field.
#[derive(Debug, Clone)]
pub struct CaptureRule {
    name: String,
    pattern: Regex,
    key: StatusKey,
}

impl CaptureRule {
    /// Create a capture rule. The pattern must have at least one group.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidPattern` if the regex is invalid.
    pub fn new(name: impl Into<String>, pattern: &str, key: StatusKey) -> Result<Self, RuleError> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(pattern)?,
            key,
        })
    }

    /// `<digits> constraints` into `CURRENT_CONSTRAINTS`.
    ///
    /// # Errors
    ///
    /// Returns `RuleError::InvalidPattern` if the regex is invalid.
    pub fn constraints() -> Result<Self, RuleError> {
        Self::new(
            "constraints",
            r"(?i)(\d+)\s*constraints",
            StatusKey::CurrentConstraints,
        )
    }
}

impl LineRule for CaptureRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    fn apply(&self, line: &str, record: &mut StatusRecord) {
        if let Some(value) = self
            .pattern
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        {
            record.set(self.key, value);
        }
    }
}

/// Moves the build to a stage when any of its markers appears
/// (case-insensitive), optionally recording the current step.
#[derive(Debug, Clone)]
pub struct StageRule {
    name: String,
    markers: Vec<String>,
    stage: Stage,
    step: Option<String>,
}

impl StageRule {
    #[must_use]
    pub fn new(name: impl Into<String>, markers: &[&str], stage: Stage) -> Self {
        Self {
            name: name.into(),
            markers: markers.iter().map(|m| m.to_lowercase()).collect(),
            stage,
            step: None,
        }
    }

    /// Also set `STEP` when this rule fires.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.step = Some(step.into());
        self
    }

    #[must_use]
    pub fn witness() -> Self {
        Self::new("witness", &["generating witness"], Stage::Witness)
            .with_step("generating witness")
    }

    #[must_use]
    pub fn trusted_setup() -> Self {
        Self::new("zkey", &["zkey"], Stage::TrustedSetup).with_step("generating zkey")
    }

    #[must_use]
    pub fn proving() -> Self {
        Self::new("proof", &["proof"], Stage::Proving).with_step("generating proof")
    }

    #[must_use]
    pub fn complete() -> Self {
        Self::new("complete", &["done", "success"], Stage::Complete)
    }
}

impl LineRule for StageRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.markers.iter().any(|m| lower.contains(m.as_str()))
    }

    fn apply(&self, _line: &str, record: &mut StatusRecord) {
        record.set(StatusKey::Stage, self.stage.as_str());
        if let Some(step) = &self.step {
            record.set(StatusKey::Step, step.as_str());
        }
    }
}
