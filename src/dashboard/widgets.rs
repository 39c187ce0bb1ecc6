//! Text widgets: bars and the part tracker.

use owo_colors::{AnsiColors, OwoColorize};

/// Labels of the fixed part tracker slots.
pub const PART_SLOTS: [&str; 8] = ["1A", "1B", "1C", "1D", "1E", "2", "3A", "3B"];

/// Render `[████░░░░] NN%` for `current` out of `total`.
///
/// Filled cells and percent both use integer division. A zero total is
/// treated as one.
#[must_use]
pub fn progress_bar(current: u32, total: u32, width: usize) -> String {
    let total = u64::from(total.max(1));
    let current = u64::from(current);
    let percent = current * 100 / total;
    let filled = usize::try_from(current * width as u64 / total)
        .unwrap_or(width)
        .min(width);
    format!(
        "[{}{}] {percent:3}%",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(width - filled)
    )
}

/// Number of filled cells for `value` out of `max` on a `width`-cell bar.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn metric_fill(value: f64, max: f64, width: usize) -> usize {
    let max = if max > 0.0 { max } else { 1.0 };
    let filled = value * width as f64 / max;
    if filled.is_finite() && filled > 0.0 {
        (filled as usize).min(width)
    } else {
        0
    }
}

/// Render a `▓▓▓░░░` bar in `color`.
#[must_use]
pub fn metric_bar(value: f64, max: f64, width: usize, color: AnsiColors) -> String {
    let filled = metric_fill(value, max, width);
    let bar = format!("{}{}", "\u{2593}".repeat(filled), "\u{2591}".repeat(width - filled));
    bar.color(color).to_string()
}

/// Green below `warn`, yellow up to `crit`, red above.
#[must_use]
pub fn color_for_percent(percent: f64, warn: f64, crit: f64) -> AnsiColors {
    if percent > crit {
        AnsiColors::Red
    } else if percent > warn {
        AnsiColors::Yellow
    } else {
        AnsiColors::Green
    }
}

/// State of one part tracker slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartSlot {
    Done,
    Active,
    Pending,
}

impl PartSlot {
    #[must_use]
    pub fn symbol(self) -> String {
        match self {
            Self::Done => "\u{2713}".green().to_string(),
            Self::Active => "\u{25cf}".yellow().to_string(),
            Self::Pending => "\u{25cb}".bright_black().to_string(),
        }
    }
}

/// Slot states for the tracker.
///
/// A slot is done once a later part has completed; the slot matching the
/// completed count shows as active while a part is being compiled.
#[must_use]
pub fn part_slots(completed: u32, part_active: bool) -> [PartSlot; 8] {
    let mut slots = [PartSlot::Pending; 8];
    for (i, slot) in (1u32..).zip(slots.iter_mut()) {
        if i < completed {
            *slot = PartSlot::Done;
        } else if i == completed && part_active {
            *slot = PartSlot::Active;
        }
    }
    slots
}

/// The three rows of the boxed part tracker.
#[must_use]
pub fn part_tracker(completed: u32, part_active: bool) -> [String; 3] {
    let slots = part_slots(completed, part_active);
    let top = format!(
        "\u{250c}{}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2510}",
        "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{252c}".repeat(PART_SLOTS.len() - 1)
    );
    let mut row = String::from("\u{2502}");
    for (label, slot) in PART_SLOTS.iter().zip(slots) {
        row.push_str(&format!(" {} {label:<2} \u{2502}", slot.symbol()));
    }
    let bottom = format!(
        "\u{2514}{}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2518}",
        "\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2500}\u{2534}".repeat(PART_SLOTS.len() - 1)
    );
    [top, row, bottom]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(s: &str, c: char) -> usize {
        s.chars().filter(|x| *x == c).count()
    }

    #[test]
    fn test_progress_bar_three_of_eight() {
        let bar = progress_bar(3, 8, 40);
        assert_eq!(count(&bar, '\u{2588}'), 15);
        assert_eq!(count(&bar, '\u{2591}'), 25);
        assert!(bar.ends_with(" 37%"));
    }

    #[test]
    fn test_progress_bar_zero_total() {
        let bar = progress_bar(0, 0, 10);
        assert_eq!(count(&bar, '\u{2591}'), 10);
        assert!(bar.ends_with("  0%"));
    }

    #[test]
    fn test_progress_bar_overflow_clamps_cells() {
        let bar = progress_bar(12, 8, 20);
        assert_eq!(count(&bar, '\u{2588}'), 20);
        assert!(bar.ends_with("150%"));
    }

    #[test]
    fn test_metric_fill() {
        assert_eq!(metric_fill(50.0, 100.0, 25), 12);
        assert_eq!(metric_fill(250.0, 100.0, 25), 25);
        assert_eq!(metric_fill(-5.0, 100.0, 25), 0);
        assert_eq!(metric_fill(1.0, 0.0, 25), 25);
        assert_eq!(metric_fill(f64::NAN, 100.0, 25), 0);
    }

    #[test]
    fn test_metric_bar_cell_count() {
        let bar = metric_bar(40.0, 100.0, 25, AnsiColors::Green);
        assert_eq!(count(&bar, '\u{2593}'), 10);
        assert_eq!(count(&bar, '\u{2591}'), 15);
    }

    #[test]
    fn test_color_thresholds() {
        assert_eq!(color_for_percent(10.0, 70.0, 90.0), AnsiColors::Green);
        assert_eq!(color_for_percent(70.0, 70.0, 90.0), AnsiColors::Green);
        assert_eq!(color_for_percent(75.0, 70.0, 90.0), AnsiColors::Yellow);
        assert_eq!(color_for_percent(95.0, 70.0, 90.0), AnsiColors::Red);
    }

    #[test]
    fn test_part_slots() {
        let slots = part_slots(3, true);
        assert_eq!(slots[0], PartSlot::Done);
        assert_eq!(slots[1], PartSlot::Done);
        assert_eq!(slots[2], PartSlot::Active);
        assert!(slots[3..].iter().all(|s| *s == PartSlot::Pending));

        let idle = part_slots(3, false);
        assert_eq!(idle[2], PartSlot::Pending);
        assert!(part_slots(0, true).iter().all(|s| *s == PartSlot::Pending));
    }

    #[test]
    fn test_part_tracker_has_every_label() {
        let [top, row, bottom] = part_tracker(0, false);
        for label in PART_SLOTS {
            assert!(row.contains(label));
        }
        assert_eq!(count(&top, '\u{252c}'), 7);
        assert_eq!(count(&bottom, '\u{2534}'), 7);
    }
}
