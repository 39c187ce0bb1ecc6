//! Build supervision: child lifecycle and output draining.

mod build;
mod error;

pub use build::*;
pub use error::*;
