//! Frame composition.
//!
//! A frame is a list of lines built from one status snapshot and one
//! metrics sample. Nothing here touches the terminal.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use owo_colors::OwoColorize;

use super::widgets::{color_for_percent, metric_bar, part_tracker, progress_bar};
use crate::display::{format_duration, format_thousands, truncate};
use crate::metrics::SystemSample;
use crate::status::{Stage, StatusRecord};

/// Inner width of the header box.
const FRAME_WIDTH: usize = 68;
/// Longest log line shown before truncation.
const LOG_LINE_WIDTH: usize = 68;
const METRIC_BAR_WIDTH: usize = 25;
const PROGRESS_BAR_WIDTH: usize = 50;
/// Bytes read from the end of the log when tailing.
const TAIL_WINDOW: u64 = 64 * 1024;

/// Cursor home followed by clear screen.
pub const CLEAR: &str = "\x1b[H\x1b[2J";

/// Everything one frame shows.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub record: &'a StatusRecord,
    pub sample: SystemSample,
    pub peak_memory_gb: f64,
    pub log_tail: &'a LogTail,
    /// Unix seconds, for the elapsed clock.
    pub now: i64,
}

/// Result of tailing the build log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTail {
    Lines(Vec<String>),
    Missing,
    Unreadable,
}

impl LogTail {
    /// Read the last `n` lines of `path`. Only the end of the file is read.
    #[must_use]
    pub fn read(path: &Path, n: usize) -> Self {
        if path.as_os_str().is_empty() || !path.exists() {
            return Self::Missing;
        }
        match read_tail(path, n) {
            Ok(lines) => Self::Lines(lines),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Failed to tail log file");
                Self::Unreadable
            }
        }
    }
}

fn read_tail(path: &Path, n: usize) -> io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    let start = len.saturating_sub(TAIL_WINDOW);
    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    let text = String::from_utf8_lossy(&buf);

    let mut lines: Vec<&str> = text.lines().collect();
    if start > 0 && !lines.is_empty() {
        // First line is probably cut mid-way.
        lines.remove(0);
    }
    let skip = lines.len().saturating_sub(n);
    Ok(lines[skip..].iter().map(|l| l.trim().to_string()).collect())
}

/// Compose the full frame, without the leading clear sequence.
#[must_use]
pub fn render_frame(view: &FrameView<'_>) -> Vec<String> {
    let mut lines = header(view.record);
    lines.extend(system_metrics(&view.sample, view.peak_memory_gb));
    lines.extend(compilation_progress(view.record, view.now));
    lines.extend(log_tail(view.log_tail));
    lines.push(String::new());
    lines.push(help_line());
    lines
}

fn header(record: &StatusRecord) -> Vec<String> {
    let mode = record.mode();
    let mode = if mode.is_empty() { "N/A" } else { mode };
    let stage = record.stage();
    let bar = "\u{2550}".repeat(FRAME_WIDTH);
    let edge = "\u{2551}".blue().to_string();
    vec![
        format!("\u{2554}{bar}\u{2557}").blue().to_string(),
        format!(
            "{edge}  {}{}{edge}",
            "\u{26a1} CIRCUIT COMPILATION DASHBOARD".white().bold(),
            " ".repeat(34)
        ),
        format!(
            "{edge}  {}{} {}{}    {edge}",
            "Mode: ".bright_black(),
            format!("{mode:<15}").cyan(),
            "Stage: ".bright_black(),
            format!("{:<20}", stage.as_str()).yellow(),
        ),
        format!("\u{255a}{bar}\u{255d}").blue().to_string(),
    ]
}

fn panel_top(title: &str) -> String {
    let fill = (FRAME_WIDTH + 1).saturating_sub(title.chars().count() + 3);
    format!("\u{250c}\u{2500} {title} {}\u{2510}", "\u{2500}".repeat(fill))
        .white()
        .bold()
        .to_string()
}

fn panel_bottom() -> String {
    format!("\u{2514}{}\u{2518}", "\u{2500}".repeat(FRAME_WIDTH + 1))
        .white()
        .to_string()
}

fn row(content: impl std::fmt::Display) -> String {
    format!("{}  {content}", "\u{2502}".white())
}

fn blank_row() -> String {
    "\u{2502}".white().to_string()
}

fn system_metrics(sample: &SystemSample, peak_memory_gb: f64) -> Vec<String> {
    let mut lines = vec![String::new(), panel_top("SYSTEM METRICS"), blank_row()];

    let cpu_color = color_for_percent(sample.cpu_percent, 50.0, 80.0);
    lines.push(row(format!(
        "{}    {} {}",
        "CPU:".cyan(),
        metric_bar(sample.cpu_percent, 100.0, METRIC_BAR_WIDTH, cpu_color),
        format!("{:5.1}%", sample.cpu_percent).color(cpu_color),
    )));

    let mem_percent = sample.mem_percent();
    let mem_color = color_for_percent(mem_percent, 70.0, 90.0);
    lines.push(row(format!(
        "{} {} {}/{}",
        "Memory:".cyan(),
        metric_bar(mem_percent, 100.0, METRIC_BAR_WIDTH, mem_color),
        format!("{:5.1}", sample.mem_used_gb).color(mem_color),
        format!("{:.0} GB", sample.mem_total_gb).white(),
    )));

    if sample.swap_total_mb > 0.0 {
        let swap_percent = sample.swap_percent();
        let swap_color = color_for_percent(swap_percent, 50.0, 80.0);
        lines.push(row(format!(
            "{}   {} {}/{}",
            "Swap:".cyan(),
            metric_bar(swap_percent, 100.0, METRIC_BAR_WIDTH, swap_color),
            format!("{:5.0}", sample.swap_used_mb).color(swap_color),
            format!("{:.0} MB", sample.swap_total_mb).white(),
        )));
    }

    lines.push(row(format!(
        "{}   {}  {}{}",
        "Load:".cyan(),
        format!("{:.2}", sample.load_avg_1m).white(),
        "Peak Mem: ".bright_black(),
        format!("{peak_memory_gb:.1} GB").magenta(),
    )));
    lines.push(blank_row());
    lines.push(panel_bottom());
    lines
}

fn compilation_progress(record: &StatusRecord, now: i64) -> Vec<String> {
    let stage = record.stage();
    let part = record.part();
    let step = record.step();
    let completed = record.completed_parts();

    let mut lines = vec![String::new(), panel_top("COMPILATION PROGRESS"), blank_row()];
    lines.push(row(format!(
        "Overall {}",
        progress_bar(completed, record.total_parts(), PROGRESS_BAR_WIDTH)
    )));
    lines.push(blank_row());
    lines.push(row("Parts Status:".bold()));
    for tracker_row in part_tracker(completed, !part.is_empty()) {
        lines.push(row(tracker_row));
    }
    lines.push(blank_row());

    match stage {
        Stage::Complete => {
            lines.push(row("\u{2713} COMPILATION COMPLETE".green().bold()));
        }
        Stage::Idle => {
            lines.push(row("Waiting for compilation to start...".bright_black()));
        }
        active => {
            lines.push(row("Current Activity:".bold()));
            lines.push(row(format!("  Stage: {}", active.as_str().cyan())));
            if !part.is_empty() {
                lines.push(row(format!("  Part:  {}", part.yellow())));
            }
            if !step.is_empty() {
                lines.push(row(format!("  Step:  {}", step.white())));
            }
            let constraints = record.current_constraints();
            if constraints > 0 {
                lines.push(row(format!(
                    "  Constraints: {}",
                    format_thousands(constraints).magenta()
                )));
            }
        }
    }
    lines.push(blank_row());

    let start = record.start_time();
    if start > 0 {
        let elapsed = u64::try_from(now.saturating_sub(start)).unwrap_or(0);
        lines.push(row(format!(
            "{} {}",
            "Elapsed:".bold(),
            format_duration(elapsed)
        )));
    }
    lines.push(blank_row());
    lines.push(panel_bottom());
    lines
}

fn log_tail(tail: &LogTail) -> Vec<String> {
    let mut lines = vec![String::new(), panel_top("RECENT LOG OUTPUT")];
    match tail {
        LogTail::Lines(log_lines) => {
            for line in log_lines {
                lines.push(row(truncate(line, LOG_LINE_WIDTH).bright_black()));
            }
        }
        LogTail::Missing => lines.push(row("No log file available".bright_black())),
        LogTail::Unreadable => lines.push(row("Error reading log file".bright_black())),
    }
    lines.push(panel_bottom());
    lines
}

fn help_line() -> String {
    let dim = |s: &'static str| s.bright_black().to_string();
    format!(
        "  {}{}{}{}{}{}{}",
        dim("Press "),
        "q".white(),
        dim(" to quit | "),
        "r".white(),
        dim(" to refresh | "),
        "h".white(),
        dim(" for help"),
    )
}

/// Lines of the transient help overlay.
#[must_use]
pub fn help_overlay() -> Vec<String> {
    vec![
        String::new(),
        "Dashboard Help:".cyan().to_string(),
        format!("  {} - Quit dashboard", "q".white()),
        format!("  {} - Force refresh", "r".white()),
        format!("  {} - Show this help", "h".white()),
    ]
}
