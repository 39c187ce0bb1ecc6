//! History and reset commands.

use std::io;
use std::path::Path;

use super::{status_store, CommandError};
use crate::config::MonitorConfig;
use crate::display::{print_history, print_reset};
use crate::history::HistoryLog;

/// Print the most recent history lines.
///
/// # Errors
///
/// Returns `CommandError::History` if the history file exists but cannot
/// be read.
pub fn show_history(config: &MonitorConfig) -> Result<(), CommandError> {
    let lines = HistoryLog::new(config.history_path())
        .tail(config.history_lines)
        .map_err(CommandError::History)?;
    print_history(lines.as_deref());
    Ok(())
}

/// Delete the status and metrics files.
///
/// # Errors
///
/// Returns `CommandError::Reset` if either file exists but cannot be
/// removed.
pub fn reset(config: &MonitorConfig) -> Result<(), CommandError> {
    status_store(config).clear().map_err(CommandError::Reset)?;
    remove_if_present(&config.metrics_path()).map_err(CommandError::Reset)?;
    tracing::info!(state_dir = %config.state_dir.display(), "Dashboard status reset");
    print_reset();
    Ok(())
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
