//! Configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::process::DEFAULT_COMPILE_FLAG;
use crate::status::DEFAULT_TOTAL_PARTS;

/// A named build: which script to run and how to label it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProfile {
    /// Script path, relative to `script_dir` unless absolute.
    pub script: PathBuf,
    /// Label stored as `MODE` in the status record.
    pub mode: String,
    /// Number of parts the build compiles.
    #[serde(default = "default_total_parts")]
    pub total_parts: u32,
    /// Flag passed to the script.
    #[serde(default = "default_compile_flag")]
    pub compile_flag: String,
}

fn default_total_parts() -> u32 {
    DEFAULT_TOTAL_PARTS
}

fn default_compile_flag() -> String {
    DEFAULT_COMPILE_FLAG.to_string()
}

impl BuildProfile {
    #[must_use]
    pub fn new(script: impl Into<PathBuf>, mode: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            mode: mode.into(),
            total_parts: default_total_parts(),
            compile_flag: default_compile_flag(),
        }
    }
}

/// Built-in profiles for the circuit build scripts.
#[must_use]
pub fn default_profiles() -> BTreeMap<String, BuildProfile> {
    [
        ("128", BuildProfile::new("run_128_split.sh", "128-validator")),
        ("128-mini", BuildProfile::new("run_128_mini.sh", "128-mini")),
        ("mini", BuildProfile::new("run_mini.sh", "mini-3part")),
    ]
    .into_iter()
    .map(|(name, profile)| (name.to_string(), profile))
    .collect()
}

/// Monitor configuration loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Directory holding the status, history, metrics and pid files.
    pub state_dir: PathBuf,
    /// Directory profile scripts are resolved against.
    pub script_dir: PathBuf,
    /// Build log location. Defaults to `<state_dir>/logs/current.log`.
    pub log_file: Option<PathBuf>,
    /// Redraw period.
    pub refresh_interval_ms: u64,
    /// Keyboard poll slice within one refresh period.
    pub poll_slice_ms: u64,
    /// How long the help overlay stays up.
    pub help_display_ms: u64,
    /// Lines shown in the recent-log panel.
    pub log_tail_lines: usize,
    /// Lines printed by `history`.
    pub history_lines: usize,
    /// Named builds, merged over the built-in set.
    pub profiles: BTreeMap<String, BuildProfile>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("."),
            script_dir: PathBuf::from("."),
            log_file: None,
            refresh_interval_ms: 1000,
            poll_slice_ms: 100,
            help_display_ms: 2000,
            log_tail_lines: 5,
            history_lines: 20,
            profiles: default_profiles(),
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn status_path(&self) -> PathBuf {
        self.state_dir.join(".dashboard_status")
    }

    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.state_dir.join(".dashboard_history")
    }

    #[must_use]
    pub fn metrics_path(&self) -> PathBuf {
        self.state_dir.join(".dashboard_metrics")
    }

    #[must_use]
    pub fn pid_path(&self) -> PathBuf {
        self.state_dir.join(".dashboard_pid")
    }

    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.state_dir.join("logs").join("current.log"))
    }

    #[must_use]
    pub fn profile(&self, name: &str) -> Option<&BuildProfile> {
        self.profiles.get(name)
    }

    /// Absolute or `script_dir`-relative path of a profile's script.
    #[must_use]
    pub fn script_path(&self, profile: &BuildProfile) -> PathBuf {
        if profile.script.is_absolute() {
            profile.script.clone()
        } else {
            self.script_dir.join(&profile.script)
        }
    }

    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    #[must_use]
    pub fn poll_slice(&self) -> Duration {
        Duration::from_millis(self.poll_slice_ms.clamp(1, self.refresh_interval_ms.max(1)))
    }

    #[must_use]
    pub fn help_display(&self) -> Duration {
        Duration::from_millis(self.help_display_ms)
    }
}
