//! Status file behavior as seen by an attached dashboard.

use build_monitor::status::{StatusKey, StatusRecord, StatusStore};
use tempfile::TempDir;

fn store(dir: &TempDir) -> StatusStore {
    StatusStore::new(
        dir.path().join(".dashboard_status"),
        dir.path().join("logs/current.log"),
    )
}

#[test]
fn file_written_elsewhere_is_read_verbatim() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    let content = "MODE=128-validator\nSTAGE=proving\nCUSTOM_KEY=kept\nCOMPLETED_PARTS=7\n";
    std::fs::write(store.path(), content).unwrap();

    let record = store.read();
    assert_eq!(record.get(StatusKey::Stage), Some("proving"));
    assert_eq!(record.get_raw("CUSTOM_KEY"), Some("kept"));
    assert_eq!(record.completed_parts(), 7);

    store.write(&record);
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), content);
}

#[test]
fn garbage_values_degrade_to_defaults() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    std::fs::write(
        store.path(),
        "TOTAL_PARTS=eight\nCOMPLETED_PARTS=-1\nPEAK_MEMORY=lots\nSTART_TIME=\nnot a pair\n",
    )
    .unwrap();

    let record = store.read();
    assert_eq!(record.total_parts(), 8);
    assert_eq!(record.completed_parts(), 0);
    assert!(record.peak_memory().abs() < f64::EPSILON);
    assert_eq!(record.start_time(), 0);
    assert_eq!(record.len(), 4);
}

#[test]
fn peak_memory_only_rises() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.init("monitoring", 8);

    for sample in [2.0, 5.0, 3.0] {
        store.track_peak_memory(sample);
    }
    assert_eq!(store.read().get(StatusKey::PeakMemory), Some("5.0"));
}

#[test]
fn update_on_missing_file_creates_it() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    assert!(!store.exists());

    store.update(StatusKey::Stage, "witness");

    assert!(store.exists());
    let mut expected = StatusRecord::new();
    expected.set(StatusKey::Stage, "witness");
    assert_eq!(store.read(), expected);
}

#[test]
fn no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.init("mini-3part", 8);
    store.update(StatusKey::Part, "Part");

    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![".dashboard_status".to_string()]);
}
