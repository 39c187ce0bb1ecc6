//! Supervisor error types.

use std::path::PathBuf;

use crate::process::SpawnError;

/// Errors that can occur while starting a supervised build.
///
/// Only startup can fail. Once the child is running, every problem is
/// logged and absorbed so the dashboard keeps going.
#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    /// The build could not be launched.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// The durable build log could not be created.
    #[error("Failed to create log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
