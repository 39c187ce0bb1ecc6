//! Build Monitor - live terminal dashboard for long-running circuit builds.

pub mod classifier;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod history;
pub mod metrics;
pub mod process;
pub mod status;
pub mod supervisor;
