//! Applies the rule set to each line of build output.

use crate::status::{StatusRecord, StatusStore};

use super::{CaptureRule, CompletedPartRule, LineRule, PartRule, StageRule};

/// Ordered, open-ended set of [`LineRule`]s.
///
/// Holds no state between lines. Everything it learns lands in the
/// status record, so a fresh classifier can pick up a stream mid-way.
#[derive(Default)]
pub struct LogClassifier {
    rules: Vec<Box<dyn LineRule>>,
}

impl std::fmt::Debug for LogClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogClassifier")
            .field("rules", &self.rule_names())
            .finish()
    }
}

impl LogClassifier {
    /// Create a classifier with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a classifier with the standard circuit-build rules.
    #[must_use]
    pub fn with_default_rules() -> Self {
        let mut classifier = Self::new();
        classifier.add_rule(Box::new(PartRule));
        match CaptureRule::constraints() {
            Ok(rule) => classifier.add_rule(Box::new(rule)),
            Err(e) => tracing::warn!(error = %e, "Failed to compile constraints rule"),
        }
        classifier.add_rule(Box::new(CompletedPartRule));
        classifier.add_rule(Box::new(StageRule::witness()));
        classifier.add_rule(Box::new(StageRule::trusted_setup()));
        classifier.add_rule(Box::new(StageRule::proving()));
        classifier.add_rule(Box::new(StageRule::complete()));
        classifier
    }

    /// Append a rule. Rules run in insertion order.
    pub fn add_rule(&mut self, rule: Box<dyn LineRule>) {
        self.rules.push(rule);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Apply every matching rule to `record`. Returns how many fired.
    pub fn classify(&self, line: &str, record: &mut StatusRecord) -> usize {
        let mut fired = 0;
        for rule in self.rules.iter().filter(|r| r.matches(line)) {
            tracing::trace!(rule = rule.name(), line, "Rule matched");
            rule.apply(line, record);
            fired += 1;
        }
        fired
    }

    /// Classify one line against the stored record, writing it back only
    /// when some rule fired.
    pub fn process_line(&self, line: &str, store: &StatusStore) -> usize {
        let mut record = store.read();
        let fired = self.classify(line, &mut record);
        if fired > 0 {
            store.write(&record);
        }
        fired
    }
}
