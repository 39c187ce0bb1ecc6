//! Status store and classifier tests across module boundaries.

mod classify_test;
mod store_test;
