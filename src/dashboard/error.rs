//! Dashboard error types.

/// Errors that can stop the dashboard.
///
/// Only terminal setup is fatal. Problems reading status, metrics or the
/// log tail are absorbed while drawing.
#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    /// Raw mode or cursor control failed.
    #[error("Failed to configure terminal: {0}")]
    Terminal(#[source] std::io::Error),

    /// A frame could not be written.
    #[error("Failed to write to terminal: {0}")]
    Output(#[source] std::io::Error),
}
