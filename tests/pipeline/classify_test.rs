//! Classifying a build transcript into the status file.

use build_monitor::classifier::LogClassifier;
use build_monitor::status::{Stage, StatusKey, StatusStore};
use tempfile::TempDir;

const TRANSCRIPT: &str = "\
Starting build for 128 validators
Compiling Part 1A: building constraints
non-linear constraints: 0
4213377 constraints
Compiled part 1A
Compiling Part 1B
Compiled part 1B
Generating witness for sample input
Creating zkey with powers of tau
Generating proof
All done.
";

#[test]
fn transcript_walks_through_every_stage() {
    let dir = TempDir::new().unwrap();
    let store = StatusStore::new(dir.path().join(".dashboard_status"), dir.path().join("log"));
    store.init("128-validator", 8);
    let classifier = LogClassifier::with_default_rules();

    let mut stages = Vec::new();
    for line in TRANSCRIPT.lines() {
        classifier.process_line(line, &store);
        stages.push(store.read().stage());
    }

    assert_eq!(stages[0], Stage::Initializing);
    assert_eq!(stages[1], Stage::Compiling);
    assert_eq!(stages[7], Stage::Witness);
    assert_eq!(stages[8], Stage::TrustedSetup);
    assert_eq!(stages[9], Stage::Proving);
    assert_eq!(stages[10], Stage::Complete);

    let record = store.read();
    assert_eq!(record.completed_parts(), 2);
    assert_eq!(record.current_constraints(), 4_213_377);
    assert_eq!(record.get(StatusKey::Step), Some("generating proof"));
    assert_eq!(record.mode(), "128-validator");
}

#[test]
fn unmatched_line_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let store = StatusStore::new(dir.path().join(".dashboard_status"), dir.path().join("log"));
    store.init("mini-3part", 8);
    let before = std::fs::read_to_string(store.path()).unwrap();

    assert_eq!(
        LogClassifier::with_default_rules().process_line("linking object files", &store),
        0
    );
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}
