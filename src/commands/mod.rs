//! Sub-command implementations.

mod error;
mod maintenance;
mod monitor;
mod signals;

pub use error::CommandError;
pub use maintenance::*;
pub use monitor::*;
pub use signals::*;
