//! Linux backend reading `/proc`.

use std::path::{Path, PathBuf};

use super::{sanitize, MetricsProvider, SystemSample};

const KB_PER_GB: f64 = 1024.0 * 1024.0;
const KB_PER_MB: f64 = 1024.0;

/// Memory figures from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub total_kb: u64,
    pub available_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

/// Aggregate CPU jiffies from the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

/// Parse the fields of `/proc/meminfo` the dashboard needs.
#[must_use]
pub fn parse_meminfo(content: &str) -> MemInfo {
    let mut info = MemInfo::default();
    for line in content.lines() {
        let Some((name, rest)) = line.split_once(':') else {
            continue;
        };
        let value = rest
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        match name {
            "MemTotal" => info.total_kb = value,
            "MemAvailable" => info.available_kb = value,
            "SwapTotal" => info.swap_total_kb = value,
            "SwapFree" => info.swap_free_kb = value,
            _ => {}
        }
    }
    info
}

/// First field of `/proc/loadavg`.
#[must_use]
pub fn parse_loadavg(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

/// Parse the aggregate `cpu` line of `/proc/stat`. Idle includes iowait.
#[must_use]
pub fn parse_cpu_times(content: &str) -> Option<CpuTimes> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse().unwrap_or(0))
        .collect();
    if values.len() < 4 {
        return None;
    }
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        idle,
        total: values.iter().sum(),
    })
}

/// Busy share between two readings, in percent.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn cpu_percent(prev: CpuTimes, cur: CpuTimes) -> f64 {
    let total = cur.total.saturating_sub(prev.total);
    if total == 0 {
        return 0.0;
    }
    let idle = cur.idle.saturating_sub(prev.idle).min(total);
    (total - idle) as f64 / total as f64 * 100.0
}

/// Metrics from a procfs mount.
///
/// CPU usage is the busy share since the previous sample. The first
/// sample reports the average since boot.
#[derive(Debug, Clone)]
pub struct ProcfsProvider {
    root: PathBuf,
    prev_cpu: Option<CpuTimes>,
}

impl ProcfsProvider {
    /// Read from `/proc`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("/proc")
    }

    /// Read from a different procfs root (for testing).
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prev_cpu: None,
        }
    }

    /// Whether `root` looks like a usable procfs.
    #[must_use]
    pub fn available(root: &Path) -> bool {
        std::fs::metadata(root.join("meminfo")).is_ok()
    }

    fn read(&self, name: &str) -> Option<String> {
        match std::fs::read_to_string(self.root.join(name)) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::debug!(file = name, error = %e, "procfs read failed");
                None
            }
        }
    }

    fn sample_cpu(&mut self) -> f64 {
        let Some(cur) = self.read("stat").and_then(|c| parse_cpu_times(&c)) else {
            return 0.0;
        };
        let prev = self.prev_cpu.replace(cur).unwrap_or_default();
        cpu_percent(prev, cur)
    }
}

impl Default for ProcfsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsProvider for ProcfsProvider {
    fn name(&self) -> &'static str {
        "procfs"
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(&mut self) -> SystemSample {
        let mem = self
            .read("meminfo")
            .map(|c| parse_meminfo(&c))
            .unwrap_or_default();
        let load = self
            .read("loadavg")
            .and_then(|c| parse_loadavg(&c))
            .unwrap_or(0.0);

        let used_kb = mem.total_kb.saturating_sub(mem.available_kb);
        let swap_used_kb = mem.swap_total_kb.saturating_sub(mem.swap_free_kb);

        SystemSample {
            cpu_percent: sanitize(self.sample_cpu()),
            mem_used_gb: used_kb as f64 / KB_PER_GB,
            mem_total_gb: mem.total_kb as f64 / KB_PER_GB,
            swap_used_mb: swap_used_kb as f64 / KB_PER_MB,
            swap_total_mb: mem.swap_total_kb as f64 / KB_PER_MB,
            load_avg_1m: sanitize(load),
        }
    }
}
