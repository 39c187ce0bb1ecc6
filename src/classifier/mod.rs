//! Rule-based classification of build output into status updates.

mod engine;
mod rules;

pub use engine::*;
pub use rules::*;
