//! Trigger debouncing.
//!
//! A scale streams the same settled weight several times. Only the first
//! sample in any window is treated as a print trigger.

use std::time::{Duration, Instant};

/// Minimum spacing between accepted triggers.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Accept `now` if at least one window has passed since the last
    /// accepted trigger. Dropped triggers do not extend the window.
    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
