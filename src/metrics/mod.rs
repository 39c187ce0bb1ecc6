//! Host metrics sampling.
//!
//! Metrics are advisory. Providers swallow every failure and report zero
//! for whatever they could not read.

mod command;
mod procfs;
mod types;

use std::path::Path;

pub use command::*;
pub use procfs::*;
pub use types::*;

/// Pick the best provider for this host: procfs when `/proc/meminfo` is
/// readable, command scraping otherwise.
#[must_use]
pub fn detect_provider() -> Box<dyn MetricsProvider> {
    let provider: Box<dyn MetricsProvider> = if ProcfsProvider::available(Path::new("/proc")) {
        Box::new(ProcfsProvider::new())
    } else {
        Box::new(CommandProvider::new())
    };
    tracing::debug!(backend = provider.name(), "Metrics provider selected");
    provider
}
