//! Button debouncing
//!
//! Pure state machine fed with one sample per poll tick:
//!
//! ```text
//! Idle ─(low)→ DebounceWait ─(still low after window)→ Confirmed → Latched ─(high)→ Idle
//!                   └─(high before window)→ Idle
//! ```
//!
//! A press is reported once, on the Confirmed transition; holding the button
//! keeps the machine latched until release. A new low edge that starts within
//! the window of the last confirmed press is swallowed.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    DebounceWait { since: Instant },
    /// Press reported (or edge ignored); waiting for release
    Latched,
}

#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    state: DebounceState,
    last_press: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceState::Idle,
            last_press: None,
        }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Feed one sample; returns `true` exactly when a press is confirmed
    pub fn update(&mut self, pressed: bool, now: Instant) -> bool {
        match self.state {
            DebounceState::Idle => {
                if pressed {
                    let too_soon = self
                        .last_press
                        .is_some_and(|last| now.saturating_duration_since(last) < self.window);
                    self.state = if too_soon {
                        DebounceState::Latched
                    } else {
                        DebounceState::DebounceWait { since: now }
                    };
                }
                false
            }
            DebounceState::DebounceWait { since } => {
                if !pressed {
                    self.state = DebounceState::Idle;
                    false
                } else if now.saturating_duration_since(since) >= self.window {
                    self.state = DebounceState::Latched;
                    self.last_press = Some(now);
                    true
                } else {
                    false
                }
            }
            DebounceState::Latched => {
                if !pressed {
                    self.state = DebounceState::Idle;
                }
                false
            }
        }
    }
}
