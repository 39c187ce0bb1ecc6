//! Build script process spawning, output capture, and pid bookkeeping.

mod output;
mod pidfile;
mod spawn;

pub use output::*;
pub use pidfile::*;
pub use spawn::*;
