//! The polling draw loop.

use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use super::input::{CrosstermKeys, Key, KeySource};
use super::render::{help_overlay, render_frame, FrameView, LogTail, CLEAR};
use super::terminal::{
    install_panic_hook, remove_panic_hook, CrosstermTerminal, TerminalGuard, TerminalMode,
};
use super::DashboardError;
use crate::config::MonitorConfig;
use crate::metrics::MetricsProvider;
use crate::status::StatusStore;

/// Renderer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Running,
    Stopped,
}

/// Timing and layout knobs for the renderer.
#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub refresh_interval: Duration,
    pub poll_slice: Duration,
    pub help_display: Duration,
    pub log_tail_lines: usize,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

impl RendererSettings {
    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            poll_slice: config.poll_slice(),
            help_display: config.help_display(),
            log_tail_lines: config.log_tail_lines,
        }
    }

    /// Number of key polls per refresh period.
    #[must_use]
    pub fn slices_per_refresh(&self) -> u32 {
        let slice = self.poll_slice.as_millis().max(1);
        let slices = (self.refresh_interval.as_millis() / slice).max(1);
        u32::try_from(slices).unwrap_or(u32::MAX)
    }
}

/// Live dashboard over a [`StatusStore`] and a metrics provider.
///
/// Redraws every refresh period and stops when its token is cancelled,
/// either by a quit key or from outside (signal handler, build exit).
pub struct TerminalRenderer<M> {
    store: StatusStore,
    metrics: M,
    settings: RendererSettings,
    cancel: CancellationToken,
    state: RendererState,
    output_failed: bool,
}

impl<M: MetricsProvider> TerminalRenderer<M> {
    #[must_use]
    pub fn new(
        store: StatusStore,
        metrics: M,
        settings: RendererSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            metrics,
            settings,
            cancel,
            state: RendererState::Stopped,
            output_failed: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> RendererState {
        self.state
    }

    /// Token that stops the draw loop.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run on the real terminal until stopped.
    ///
    /// Terminal problems never end the run early: without raw mode the
    /// dashboard keeps drawing with keys disabled, and failed writes are
    /// logged and retried on the next refresh.
    pub fn run(&mut self) {
        let mut terminal = CrosstermTerminal::new();
        let mut keys = CrosstermKeys;
        let mut stdout = io::stdout();
        install_panic_hook();
        self.run_with(&mut terminal, &mut keys, &mut stdout);
        remove_panic_hook();
    }

    /// Run against the given terminal, key source and output.
    ///
    /// The terminal is in dashboard mode exactly while this runs, if it
    /// could be put there at all. Keys are only polled in dashboard mode;
    /// otherwise only the cancel token stops the loop.
    pub fn run_with<T, K, W>(&mut self, terminal: &mut T, keys: &mut K, out: &mut W)
    where
        T: TerminalMode,
        K: KeySource,
        W: Write,
    {
        let guard = TerminalGuard::acquire(terminal);
        let keys = guard.is_active().then_some(keys);
        self.state = RendererState::Running;
        tracing::info!(status = %self.store.path().display(), keys = keys.is_some(), "Dashboard started");

        self.draw_loop(keys, out);

        self.state = RendererState::Stopped;
        tracing::info!("Dashboard stopped");
        if let Err(e) = guard.release() {
            tracing::warn!(error = %e, "Failed to restore terminal");
        }
    }

    fn draw_loop<K: KeySource, W: Write>(&mut self, mut keys: Option<&mut K>, out: &mut W) {
        while !self.cancel.is_cancelled() {
            let frame = self.compose_frame();
            self.present(out, CLEAR, &frame);
            self.wait_for_input(keys.as_deref_mut(), out);
        }
    }

    /// Read status, sample metrics and track peak memory into one frame.
    pub fn compose_frame(&mut self) -> Vec<String> {
        let record = self.store.read();
        let sample = self.metrics.sample();
        let peak_memory_gb = self.store.track_peak_memory(sample.mem_used_gb);
        let log_tail = LogTail::read(Path::new(record.log_file()), self.settings.log_tail_lines);
        render_frame(&FrameView {
            record: &record,
            sample,
            peak_memory_gb,
            log_tail: &log_tail,
            now: Utc::now().timestamp(),
        })
    }

    /// Poll keys until the refresh period ends, a redraw is requested, or
    /// the renderer is stopped. Without keys, just wait out the period.
    fn wait_for_input<K: KeySource, W: Write>(&mut self, keys: Option<&mut K>, out: &mut W) {
        let Some(keys) = keys else {
            self.pause(self.settings.refresh_interval);
            return;
        };
        for _ in 0..self.settings.slices_per_refresh() {
            if self.cancel.is_cancelled() {
                return;
            }
            match keys.poll_key(self.settings.poll_slice) {
                Some(Key::Quit) => {
                    tracing::debug!("Quit key pressed");
                    self.cancel.cancel();
                    return;
                }
                Some(Key::Refresh) => return,
                Some(Key::Help) => {
                    self.present(out, "", &help_overlay());
                    self.pause(self.settings.help_display);
                    return;
                }
                None => {}
            }
        }
    }

    /// Write a screen, logging the first failure of a run and the first
    /// success after it.
    fn present<W: Write>(&mut self, out: &mut W, prefix: &str, lines: &[String]) {
        match write_screen(out, prefix, lines) {
            Ok(()) if self.output_failed => {
                self.output_failed = false;
                tracing::info!("Terminal output recovered");
            }
            Ok(()) => {}
            Err(e) if self.output_failed => tracing::debug!(error = %e, "Frame not written"),
            Err(e) => {
                self.output_failed = true;
                tracing::warn!(error = %e, "Frame not written, retrying next refresh");
            }
        }
    }

    /// Sleep for `duration`, waking every poll slice to check for stop.
    fn pause(&self, duration: Duration) {
        let mut remaining = duration;
        while !remaining.is_zero() && !self.cancel.is_cancelled() {
            let step = remaining.min(self.settings.poll_slice);
            std::thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
    }
}

/// Write lines with CRLF endings (raw mode does no newline translation)
/// and flush once.
fn write_screen<W: Write>(
    out: &mut W,
    prefix: &str,
    lines: &[String],
) -> Result<(), DashboardError> {
    let mut buf = String::from(prefix);
    for line in lines {
        buf.push_str(line);
        buf.push_str("\r\n");
    }
    out.write_all(buf.as_bytes())
        .and_then(|()| out.flush())
        .map_err(DashboardError::Output)
}
