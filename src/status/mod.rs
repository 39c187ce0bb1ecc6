//! Shared build status: the record type and its file-backed store.

mod record;
mod store;

pub use record::*;
pub use store::*;
