//! Supervisor module tests.

mod build_test;

/// Verify the public supervision types are exported from the library.
#[test]
fn test_supervisor_types_exported() {
    use build_monitor::process::{BuildCommand, PidFile, SpawnError, DEFAULT_COMPILE_FLAG};
    use build_monitor::supervisor::{BuildOutcome, BuildSupervisor, SupervisorError};

    let _ = BuildCommand::new("run_mini.sh");
    let _ = PidFile::new(".dashboard_pid");
    let _: fn() -> SupervisorError = || SpawnError::NotFound("x".into()).into();
    let _: fn() -> SpawnError = || SpawnError::NotFound("x".into());
    let _ = BuildOutcome::Terminated;
    let _ = std::mem::size_of::<BuildSupervisor>();
    assert_eq!(DEFAULT_COMPILE_FLAG, "--compile-only");
}
