//! Colored CLI output and shared text formatting.
//!
//! This module provides functions for printing colored, formatted
//! messages outside the dashboard, plus the formatting helpers the
//! dashboard and history share.

use std::io::{self, Write};

use owo_colors::OwoColorize;

/// Truncate a string to `max_len` characters, adding an ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// Format seconds as `HH:MM:SS`. Hours grow past two digits as needed.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{mins:02}:{secs:02}")
}

/// Insert `,` between groups of three digits.
#[must_use]
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Print build start information.
pub fn print_build_start(script: &str, mode: &str) {
    println!(
        "{} Starting build: {} (mode={})",
        "[BUILD]".blue().bold(),
        script.cyan(),
        mode
    );
    let _ = io::stdout().flush();
}

/// Print the outcome of a supervised build after the dashboard closes.
pub fn print_build_end(summary: &str) {
    println!("{} {}", "[BUILD]".blue().bold(), summary);
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}

/// Print the compilation history listing.
pub fn print_history(lines: Option<&[String]>) {
    println!("{}", "Compilation History".blue().bold());
    println!("{}", "\u{2500}".repeat(45).dimmed());
    match lines {
        Some(lines) => {
            for line in lines {
                println!("{line}");
            }
        }
        None => println!("{}", "No compilation history available".dimmed()),
    }
    let _ = io::stdout().flush();
}

/// Print reset confirmation.
pub fn print_reset() {
    println!("Dashboard status reset");
    let _ = io::stdout().flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_very_short_max() {
        assert_eq!(truncate("hello", 3), "...");
        assert_eq!(truncate("hello", 0), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        let s = "\u{2713}".repeat(10);
        let out = truncate(&s, 6);
        assert_eq!(out.chars().count(), 6);
        assert!(out.ends_with("..."));
    }

    #[test]
    fn test_truncate_log_line_width() {
        let line = "x".repeat(100);
        let out = truncate(&line, 68);
        assert_eq!(out.len(), 68);
        assert!(out.starts_with(&"x".repeat(65)));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_duration(360_000), "100:00:00");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(12_345_678), "12,345,678");
    }
}
