//! Terminal mode acquisition and restoration.

use std::io::{self, Write};
use std::panic::PanicHookInfo;
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::{cursor, execute, terminal};

use super::DashboardError;

/// Switches the terminal in and out of dashboard mode.
pub trait TerminalMode {
    /// Enter raw mode with the cursor hidden.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Terminal`] if the terminal cannot be
    /// configured. Nothing is left half-configured on failure.
    fn enter(&mut self) -> Result<(), DashboardError>;

    /// Undo [`enter`](Self::enter).
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Terminal`] if restoring fails.
    fn restore(&mut self) -> Result<(), DashboardError>;
}

/// Real terminal on stdout, driven by crossterm.
#[derive(Debug, Default)]
pub struct CrosstermTerminal;

impl CrosstermTerminal {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TerminalMode for CrosstermTerminal {
    fn enter(&mut self) -> Result<(), DashboardError> {
        terminal::enable_raw_mode().map_err(DashboardError::Terminal)?;
        if let Err(e) = execute!(io::stdout(), cursor::Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(DashboardError::Terminal(e));
        }
        tracing::debug!("Terminal entered raw mode");
        Ok(())
    }

    fn restore(&mut self) -> Result<(), DashboardError> {
        let raw = terminal::disable_raw_mode();
        let mut stdout = io::stdout();
        let shown = execute!(stdout, cursor::Show).and_then(|()| {
            // Leave the prompt below the last frame.
            write!(stdout, "\r\n")?;
            stdout.flush()
        });
        tracing::debug!("Terminal restored");
        raw.and(shown).map_err(DashboardError::Terminal)
    }
}

/// Holds a terminal in dashboard mode until dropped.
///
/// Restoration happens at most once, either through
/// [`release`](Self::release) or on drop, and only if entering succeeded.
/// Early returns, panics and cancellation all leave the terminal usable.
pub struct TerminalGuard<'a, T: TerminalMode> {
    terminal: &'a mut T,
    active: bool,
}

impl<'a, T: TerminalMode> TerminalGuard<'a, T> {
    /// Enter dashboard mode if the terminal allows it.
    ///
    /// A terminal that cannot enter raw mode (no tty, restricted
    /// capabilities) is logged and left as it is. The guard is then
    /// inactive and restores nothing.
    pub fn acquire(terminal: &'a mut T) -> Self {
        let active = match terminal.enter() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Terminal unavailable, drawing without raw mode");
                false
            }
        };
        Self { terminal, active }
    }

    /// Whether the terminal is in raw mode and keys can be read.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Restore the terminal now.
    ///
    /// # Errors
    ///
    /// Returns the error from [`TerminalMode::restore`].
    pub fn release(mut self) -> Result<(), DashboardError> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.terminal.restore()
    }
}

impl<T: TerminalMode> Drop for TerminalGuard<'_, T> {
    fn drop(&mut self) {
        if self.active {
            self.active = false;
            if let Err(e) = self.terminal.restore() {
                tracing::warn!(error = %e, "Failed to restore terminal");
            }
        }
    }
}

type PanicHook = Arc<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

/// Hook that was in place before [`install_panic_hook`].
static PREVIOUS_HOOK: Mutex<Option<PanicHook>> = Mutex::new(None);

/// Restore the terminal before the panic message is printed.
///
/// Pair with [`remove_panic_hook`] once the dashboard exits.
pub fn install_panic_hook() {
    let previous: PanicHook = Arc::from(std::panic::take_hook());
    let chained = Arc::clone(&previous);
    std::panic::set_hook(Box::new(move |info| {
        let _ = terminal::disable_raw_mode();
        let _ = execute!(io::stderr(), cursor::Show);
        chained(info);
    }));
    *PREVIOUS_HOOK
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(previous);
}

/// Put back the hook that [`install_panic_hook`] replaced.
pub fn remove_panic_hook() {
    let previous = PREVIOUS_HOOK
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    let _ = std::panic::take_hook();
    if let Some(previous) = previous {
        std::panic::set_hook(Box::new(move |info| previous(info)));
    }
}

/// Counts enter/restore calls instead of touching a tty.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingTerminal {
    pub enters: usize,
    pub restores: usize,
    pub fail_enter: bool,
}

#[cfg(test)]
impl TerminalMode for RecordingTerminal {
    fn enter(&mut self) -> Result<(), DashboardError> {
        if self.fail_enter {
            return Err(DashboardError::Terminal(io::Error::new(
                io::ErrorKind::Unsupported,
                "not a tty",
            )));
        }
        self.enters += 1;
        Ok(())
    }

    fn restore(&mut self) -> Result<(), DashboardError> {
        self.restores += 1;
        Ok(())
    }
}
