//! Non-interactive sub-commands: history, reset and configuration errors.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn monitor(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_build-monitor"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute build-monitor")
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("monitor.toml");
    std::fs::write(
        &path,
        format!("state_dir = {:?}\nhistory_lines = 2\n", dir.path().display().to_string()),
    )
    .unwrap();
    path
}

#[test]
fn help_lists_subcommands() {
    let output = Command::new(env!("CARGO_BIN_EXE_build-monitor"))
        .arg("--help")
        .output()
        .expect("Failed to execute build-monitor");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for word in ["run", "history", "reset", "--trace-log", "--config"] {
        assert!(stdout.contains(word), "help should mention {word}");
    }
}

#[test]
fn history_without_file() {
    let dir = TempDir::new().unwrap();
    let output = monitor(&write_config(&dir), &["history"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Compilation History"));
    assert!(stdout.contains("No compilation history available"));
}

#[test]
fn history_shows_last_lines() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".dashboard_history"), "run one\nrun two\nrun three\n").unwrap();

    let output = monitor(&write_config(&dir), &["history"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(!stdout.contains("run one"));
    assert!(stdout.contains("run two"));
    assert!(stdout.contains("run three"));
}

#[test]
fn reset_deletes_status() {
    let dir = TempDir::new().unwrap();
    let status = dir.path().join(".dashboard_status");
    std::fs::write(&status, "STAGE=complete\n").unwrap();

    let output = monitor(&write_config(&dir), &["reset"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Dashboard status reset"));
    assert!(!status.exists());
}

#[test]
fn unknown_profile_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let output = monitor(&write_config(&dir), &["run", "256"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown build profile '256'"));
}

#[test]
fn missing_script_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let output = monitor(&write_config(&dir), &["run", "mini"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("run_mini.sh"));
    assert!(!dir.path().join(".dashboard_status").exists());
}

#[test]
fn unparseable_config_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "refresh_interval_ms = \"soon\"\n").unwrap();

    let output = monitor(&path, &["history"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse config file"));
}

#[test]
fn missing_explicit_config_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let output = monitor(&dir.path().join("absent.toml"), &["history"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.toml"));
}

/// Attach in a new session with no controlling terminal, then stop it
/// with SIGTERM. Skipped where `setsid` is not installed.
#[cfg(unix)]
#[test]
fn attach_without_terminal_still_draws() {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    use std::process::Stdio;

    if Command::new("setsid").arg("--version").output().is_err() {
        return;
    }
    let dir = TempDir::new().unwrap();
    let child = Command::new("setsid")
        .arg(env!("CARGO_BIN_EXE_build-monitor"))
        .arg("--config")
        .arg(write_config(&dir))
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to execute build-monitor");

    std::thread::sleep(std::time::Duration::from_millis(1500));
    let pid = Pid::from_raw(i32::try_from(child.id()).unwrap());
    kill(pid, Signal::SIGTERM).unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("SYSTEM METRICS"));
    assert!(dir.path().join(".dashboard_status").exists());
}
