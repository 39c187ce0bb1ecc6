//! Fallback backend scraping `top`, `sysctl` and `vm_stat` output.
//!
//! Used where procfs is absent (macOS). Each command runs on every
//! sample; a command that is missing or prints something unexpected
//! contributes zeros.

use std::process::Command;

use super::{sanitize, MetricsProvider, SystemSample};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const DEFAULT_PAGE_SIZE: u64 = 16384;

/// Run a command and return its stdout, or `None` on any failure.
fn run(program: &str, args: &[&str]) -> Option<String> {
    match Command::new(program).args(args).output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            tracing::debug!(program, status = %output.status, "Metrics command failed");
            None
        }
        Err(e) => {
            tracing::debug!(program, error = %e, "Metrics command unavailable");
            None
        }
    }
}

/// CPU busy percent from the `CPU usage:` line of `top -l 1`.
///
/// Uses `100 - idle` when an idle figure is present, otherwise the first
/// percentage on the line.
#[must_use]
pub fn parse_top_cpu(output: &str) -> Option<f64> {
    let line = output.lines().find(|l| l.contains("CPU usage"))?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let pct = |t: &str| t.trim_end_matches(',').strip_suffix('%')?.parse::<f64>().ok();

    for (i, token) in tokens.iter().enumerate() {
        if tokens.get(i + 1).is_some_and(|next| next.starts_with("idle")) {
            if let Some(idle) = pct(*token) {
                return Some(100.0 - idle);
            }
        }
    }
    tokens.iter().skip(1).find_map(|t| pct(*t))
}

/// Used bytes from `vm_stat`: active + wired + compressed pages.
#[must_use]
pub fn parse_vm_stat(output: &str) -> u64 {
    let page_size = output
        .lines()
        .next()
        .and_then(|header| {
            let rest = header.split("page size of ").nth(1)?;
            rest.split_whitespace().next()?.parse().ok()
        })
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let mut pages: u64 = 0;
    for line in output.lines() {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        if matches!(
            name.trim(),
            "Pages active" | "Pages wired down" | "Pages occupied by compressor"
        ) {
            pages += value.trim().trim_end_matches('.').parse::<u64>().unwrap_or(0);
        }
    }
    pages.saturating_mul(page_size)
}

/// `(used_mb, total_mb)` from `sysctl -n vm.swapusage`.
#[must_use]
pub fn parse_swapusage(output: &str) -> (f64, f64) {
    let tokens: Vec<&str> = output.split_whitespace().collect();
    let value_after = |label: &str| {
        let i = tokens.iter().position(|t| *t == label)?;
        tokens.get(i + 2)?.trim_end_matches('M').parse::<f64>().ok()
    };
    (
        value_after("used").unwrap_or(0.0),
        value_after("total").unwrap_or(0.0),
    )
}

/// First value of `sysctl -n vm.loadavg` (`{ 1.23 1.45 1.67 }`).
#[must_use]
pub fn parse_sysctl_loadavg(output: &str) -> Option<f64> {
    output
        .split_whitespace()
        .find(|t| *t != "{")?
        .trim_start_matches('{')
        .parse()
        .ok()
}

/// Metrics from command-line tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandProvider;

impl CommandProvider {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl MetricsProvider for CommandProvider {
    fn name(&self) -> &'static str {
        "command"
    }

    #[allow(clippy::cast_precision_loss)]
    fn sample(&mut self) -> SystemSample {
        let cpu = run("top", &["-l", "1", "-n", "0"])
            .and_then(|o| parse_top_cpu(&o))
            .unwrap_or(0.0);

        let mem_total = run("sysctl", &["-n", "hw.memsize"])
            .and_then(|o| o.trim().parse::<u64>().ok())
            .unwrap_or(0);
        // Used memory is meaningless without a total.
        let mem_used = if mem_total > 0 {
            run("vm_stat", &[]).map_or(0, |o| parse_vm_stat(&o))
        } else {
            0
        };

        let (swap_used, swap_total) = run("sysctl", &["-n", "vm.swapusage"])
            .map_or((0.0, 0.0), |o| parse_swapusage(&o));

        let load = run("sysctl", &["-n", "vm.loadavg"])
            .and_then(|o| parse_sysctl_loadavg(&o))
            .unwrap_or(0.0);

        SystemSample {
            cpu_percent: sanitize(cpu),
            mem_used_gb: mem_used as f64 / BYTES_PER_GB,
            mem_total_gb: mem_total as f64 / BYTES_PER_GB,
            swap_used_mb: sanitize(swap_used),
            swap_total_mb: sanitize(swap_total),
            load_avg_1m: sanitize(load),
        }
    }
}
