//! Command-line tests against the built binary.

mod commands_test;
