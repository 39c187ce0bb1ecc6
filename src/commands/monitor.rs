//! Attach and run-and-monitor commands.

use tokio_util::sync::CancellationToken;

use super::{spawn_signal_listener, CommandError};
use crate::classifier::LogClassifier;
use crate::config::{ConfigError, MonitorConfig};
use crate::dashboard::{RendererSettings, TerminalRenderer};
use crate::display::{print_build_end, print_build_start};
use crate::history::{describe_exit, HistoryLog};
use crate::metrics::detect_provider;
use crate::process::{BuildCommand, PidFile};
use crate::status::{StatusStore, DEFAULT_TOTAL_PARTS};
use crate::supervisor::{BuildOutcome, BuildSupervisor};

/// Mode recorded when attaching without a running build.
pub const ATTACH_MODE: &str = "monitoring";

/// Status store at the configured location.
#[must_use]
pub fn status_store(config: &MonitorConfig) -> StatusStore {
    StatusStore::new(config.status_path(), config.log_path())
}

/// Show the dashboard over whatever the status file holds.
///
/// Seeds a `monitoring` record when there is no status file yet.
///
/// # Errors
///
/// Returns `CommandError::DashboardTask` if the renderer thread panics.
pub async fn attach(config: &MonitorConfig) -> Result<(), CommandError> {
    let store = status_store(config);
    if !store.exists() {
        store.init(ATTACH_MODE, DEFAULT_TOTAL_PARTS);
    }

    let cancel = CancellationToken::new();
    let signals = spawn_signal_listener(cancel.clone());
    let result = run_dashboard(store, RendererSettings::from_config(config), cancel.clone()).await;
    cancel.cancel();
    let _ = signals.await;
    result
}

/// Start the named profile's build and show the dashboard until quit.
///
/// The build is asked to terminate when the dashboard closes, unless it
/// already finished.
///
/// # Errors
///
/// Returns `CommandError` if the profile is unknown or the build cannot
/// be started. A terminal without raw mode still gets the dashboard.
pub async fn run_profile(config: &MonitorConfig, name: &str) -> Result<(), CommandError> {
    let profile = config
        .profile(name)
        .ok_or_else(|| ConfigError::UnknownProfile {
            name: name.to_string(),
            available: config
                .profiles
                .keys()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    let script = config.script_path(profile);
    let script = std::path::absolute(&script).unwrap_or(script);
    let command = BuildCommand::new(&script)
        .args([profile.compile_flag.as_str()])
        .working_dir(&config.script_dir);

    let store = status_store(config);
    let supervisor = BuildSupervisor::new(
        store.clone(),
        LogClassifier::with_default_rules(),
        PidFile::new(config.pid_path()),
    )
    .with_history(HistoryLog::new(config.history_path()));

    print_build_start(&script.display().to_string(), &profile.mode);
    let running = supervisor
        .start(&command, &profile.mode, profile.total_parts)
        .await?;
    tracing::info!(profile = name, pid = ?running.pid(), "Build running");

    let cancel = CancellationToken::new();
    let signals = spawn_signal_listener(cancel.clone());
    let result = run_dashboard(store, RendererSettings::from_config(config), cancel.clone()).await;
    cancel.cancel();
    let _ = signals.await;

    let outcome = running.shutdown().await;
    print_build_end(&summarize(&outcome));
    result
}

/// Run the renderer on a blocking thread until `cancel` fires or the
/// operator quits.
///
/// # Errors
///
/// Returns `CommandError::DashboardTask` if the renderer thread panics.
pub async fn run_dashboard(
    store: StatusStore,
    settings: RendererSettings,
    cancel: CancellationToken,
) -> Result<(), CommandError> {
    let handle = tokio::task::spawn_blocking(move || {
        let mut renderer = TerminalRenderer::new(store, detect_provider(), settings, cancel);
        renderer.run();
    });
    handle.await?;
    Ok(())
}

/// One-line description of how a build ended.
#[must_use]
pub fn summarize(outcome: &BuildOutcome) -> String {
    match outcome {
        BuildOutcome::Exited(status) if status.success() => "Build finished successfully".to_string(),
        BuildOutcome::Exited(status) => format!("Build finished ({})", describe_exit(status)),
        BuildOutcome::Unknown => "Build finished (exit status unknown)".to_string(),
        BuildOutcome::Terminated => "Build terminated".to_string(),
    }
}
