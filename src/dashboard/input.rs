//! Non-blocking keyboard input.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Dashboard commands bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// `q`, `Q` or Ctrl-C.
    Quit,
    /// `r`, `R`, or a terminal resize.
    Refresh,
    /// `h` or `H`.
    Help,
}

/// Source of keystrokes for the draw loop.
pub trait KeySource {
    /// Wait up to `timeout` for a bound key.
    ///
    /// Returns `None` on timeout, for unbound keys, and when the input
    /// backend fails.
    fn poll_key(&mut self, timeout: Duration) -> Option<Key>;
}

/// Reads keys from the controlling terminal.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn poll_key(&mut self, timeout: Duration) -> Option<Key> {
        match event::poll(timeout) {
            Ok(true) => match event::read() {
                Ok(ev) => map_event(&ev),
                Err(e) => {
                    tracing::debug!(error = %e, "Failed to read terminal event");
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to poll terminal events");
                // Keep the cadence even without input.
                std::thread::sleep(timeout);
                None
            }
        }
    }
}

/// Map a terminal event to a dashboard command.
#[must_use]
pub fn map_event(event: &Event) -> Option<Key> {
    match event {
        Event::Key(key) => map_key(key),
        Event::Resize(..) => Some(Key::Refresh),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<Key> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Quit),
        KeyCode::Char('q' | 'Q') => Some(Key::Quit),
        KeyCode::Char('r' | 'R') => Some(Key::Refresh),
        KeyCode::Char('h' | 'H') => Some(Key::Help),
        _ => None,
    }
}

/// Replays scripted keys, one per poll. `None` entries are timeouts; once
/// the script runs out every poll times out.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedKeys {
    pub keys: std::collections::VecDeque<Option<Key>>,
    pub polls: usize,
}

#[cfg(test)]
impl ScriptedKeys {
    pub fn new(keys: impl IntoIterator<Item = Option<Key>>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            polls: 0,
        }
    }
}

#[cfg(test)]
impl KeySource for ScriptedKeys {
    fn poll_key(&mut self, timeout: Duration) -> Option<Key> {
        self.polls += 1;
        if let Some(key) = self.keys.pop_front() {
            key
        } else {
            std::thread::sleep(timeout);
            None
        }
    }
}
