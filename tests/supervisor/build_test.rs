//! Integration tests for supervised builds, using `sh` scripts as the child.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use build_monitor::classifier::LogClassifier;
use build_monitor::history::HistoryLog;
use build_monitor::process::{BuildCommand, PidFile, SpawnError};
use build_monitor::status::{Stage, StatusStore};
use build_monitor::supervisor::{BuildOutcome, BuildSupervisor, SupervisorError};
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    store: StatusStore,
    pid_file: PidFile,
    history: HistoryLog,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = StatusStore::new(
            dir.path().join(".dashboard_status"),
            dir.path().join("logs").join("current.log"),
        );
        let pid_file = PidFile::new(dir.path().join(".dashboard_pid"));
        let history = HistoryLog::new(dir.path().join(".dashboard_history"));
        Self {
            dir,
            store,
            pid_file,
            history,
        }
    }

    fn supervisor(&self) -> BuildSupervisor {
        BuildSupervisor::new(
            self.store.clone(),
            LogClassifier::with_default_rules(),
            self.pid_file.clone(),
        )
        .with_history(self.history.clone())
    }

    fn script(&self, body: &str) -> PathBuf {
        let path = self.dir.path().join("run_test.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn log_contents(&self) -> String {
        std::fs::read_to_string(self.store.log_file()).unwrap_or_default()
    }
}

async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

fn exit_code(outcome: &BuildOutcome) -> Option<i32> {
    match outcome {
        BuildOutcome::Exited(status) => status.code(),
        _ => None,
    }
}

#[tokio::test]
async fn build_output_is_classified_and_logged() {
    let fx = Fixture::new();
    let script = fx.script(
        r#"echo "Compiling Part 1A: building constraints"
echo "12345 constraints generated"
echo "Compiled part 1A"
echo "Compiled part 1B"
echo "Generating witness"
exit 0"#,
    );

    let running = fx
        .supervisor()
        .start(&BuildCommand::new(&script), "mini-3part", 8)
        .await
        .unwrap();
    let outcome = running.wait().await;

    assert_eq!(exit_code(&outcome), Some(0));

    let record = fx.store.read();
    assert_eq!(record.stage(), Stage::Complete);
    assert_eq!(record.mode(), "mini-3part");
    assert_eq!(record.completed_parts(), 2);
    assert_eq!(record.current_constraints(), 12345);
    assert_eq!(record.part(), "part");
    assert_eq!(record.step(), "generating witness");
    assert_eq!(record.total_parts(), 8);
    assert!(record.start_time() > 0);
    assert_eq!(
        Path::new(record.log_file()),
        fx.store.log_file(),
        "LOG_FILE should point at the durable log"
    );

    let log = fx.log_contents();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "Compiling Part 1A: building constraints");
    assert_eq!(lines[4], "Generating witness");

    assert!(!fx.pid_file.path().exists());

    let history = fx.history.tail(20).unwrap().unwrap();
    assert_eq!(history.len(), 1);
    assert!(history[0].contains("mode=mini-3part stage=complete exit=0"));
}

#[tokio::test]
async fn failing_build_still_ends_complete() {
    let fx = Fixture::new();
    let script = fx.script("echo \"Compiling Part 2\"\nexit 3");

    let running = fx
        .supervisor()
        .start(&BuildCommand::new(&script), "128-mini", 8)
        .await
        .unwrap();
    let outcome = running.wait().await;

    assert_eq!(exit_code(&outcome), Some(3));
    assert_eq!(fx.store.read().stage(), Stage::Complete);

    let history = fx.history.tail(20).unwrap().unwrap();
    assert!(history[0].contains("exit=3"));
}

#[tokio::test]
async fn stderr_is_captured() {
    let fx = Fixture::new();
    let script = fx.script("echo \"writing zkey file\" 1>&2");

    let running = fx
        .supervisor()
        .start(&BuildCommand::new(&script), "mini-3part", 8)
        .await
        .unwrap();
    running.wait().await;

    let record = fx.store.read();
    assert_eq!(record.step(), "generating zkey");
    assert_eq!(record.stage(), Stage::Complete);
    assert!(fx.log_contents().contains("writing zkey file"));
}

#[tokio::test]
async fn missing_script_is_not_found() {
    let fx = Fixture::new();
    let script = fx.dir.path().join("run_missing.sh");

    let err = fx
        .supervisor()
        .start(&BuildCommand::new(&script), "mini-3part", 8)
        .await
        .unwrap_err();

    match err {
        SupervisorError::Spawn(SpawnError::NotFound(path)) => assert_eq!(path, script),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!fx.store.exists());
    assert!(!fx.pid_file.path().exists());
}

#[tokio::test]
async fn shutdown_terminates_running_build() {
    let fx = Fixture::new();
    let script = fx.script("echo \"Compiling Part 3A\"\nexec sleep 30");

    let running = fx
        .supervisor()
        .start(&BuildCommand::new(&script), "128-validator", 8)
        .await
        .unwrap();

    assert!(running.pid().is_some());
    assert_eq!(fx.pid_file.read(), running.pid());

    // Lines reach the log and the status record while the build runs.
    assert!(eventually(|| fx.log_contents().contains("Compiling Part 3A")).await);
    assert!(eventually(|| fx.store.read().stage() == Stage::Compiling).await);
    assert!(!running.is_finished());

    let outcome = tokio::time::timeout(Duration::from_secs(5), running.shutdown())
        .await
        .unwrap();

    assert!(matches!(outcome, BuildOutcome::Terminated));
    assert!(!fx.pid_file.path().exists());
    assert_eq!(fx.store.read().stage(), Stage::Compiling);
}

#[tokio::test]
async fn restart_reinitializes_record() {
    let fx = Fixture::new();
    let script = fx.script("echo \"Compiled part 1A\"");

    for _ in 0..2 {
        let running = fx
            .supervisor()
            .start(&BuildCommand::new(&script), "mini-3part", 8)
            .await
            .unwrap();
        running.wait().await;
    }

    assert_eq!(fx.store.read().completed_parts(), 1);
    assert_eq!(fx.history.tail(20).unwrap().unwrap().len(), 2);
    assert_eq!(fx.log_contents(), "Compiled part 1A\n");
}

#[tokio::test]
async fn interleaved_stdout_and_stderr_keep_write_order() {
    let fx = Fixture::new();
    let script = fx.script(
        r#"i=0
while [ $i -lt 300 ]; do
  echo "out $i"
  echo "err $i" 1>&2
  i=$((i + 1))
done"#,
    );

    let running = fx
        .supervisor()
        .start(&BuildCommand::new(&script), "mini-3part", 8)
        .await
        .unwrap();
    running.wait().await;

    let expected: Vec<String> = (0..300)
        .flat_map(|i| [format!("out {i}"), format!("err {i}")])
        .collect();
    let log = fx.log_contents();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn unwritable_log_leaves_record_untouched() {
    let dir = TempDir::new().unwrap();
    // A regular file where the log directory should be.
    std::fs::write(dir.path().join("logs"), "").unwrap();
    let store = StatusStore::new(
        dir.path().join(".dashboard_status"),
        dir.path().join("logs").join("current.log"),
    );
    store.init("128-mini", 8);
    store.update(build_monitor::status::StatusKey::CompletedParts, "5");

    let pid_file = PidFile::new(dir.path().join(".dashboard_pid"));
    let supervisor = BuildSupervisor::new(
        store.clone(),
        LogClassifier::with_default_rules(),
        pid_file.clone(),
    );
    let script = dir.path().join("run_test.sh");
    std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let err = supervisor
        .start(&BuildCommand::new(&script), "mini-3part", 8)
        .await
        .unwrap_err();

    assert!(matches!(err, SupervisorError::LogFile { .. }));
    let record = store.read();
    assert_eq!(record.mode(), "128-mini");
    assert_eq!(record.completed_parts(), 5);
    assert!(!pid_file.path().exists());
}
