//! Command error types.

use crate::config::ConfigError;
use crate::supervisor::SupervisorError;

/// Errors a sub-command reports to the operator before exiting non-zero.
#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// The dashboard thread panicked or was cancelled.
    #[error("Dashboard task failed: {0}")]
    DashboardTask(#[from] tokio::task::JoinError),

    #[error("Failed to read history file: {0}")]
    History(#[source] std::io::Error),

    #[error("Failed to reset dashboard status: {0}")]
    Reset(#[source] std::io::Error),
}
