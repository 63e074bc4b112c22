//! Wrap-around-safe one-shot countdown timer.
//!
//! Time is a `u32` millisecond counter that wraps roughly every 49.7 days.
//! The deadline comparison uses the signed difference `now - deadline`, so a
//! timer armed just before the wrap still fires at the right relative offset.
//!
//! Once a timer has been observed expired it latches: it will not "un-expire"
//! when the clock later wraps past the deadline again. Poll it at least once
//! every 2^31 ms while armed.

/// One-shot timeout, polled with an externally supplied `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    deadline: u32,
    expired: bool,
}

impl Default for Timeout {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeout {
    /// A timer that is already expired.
    pub const fn new() -> Self {
        Self {
            deadline: 0,
            expired: true,
        }
    }

    /// Start (or restart) the timer to fire `duration_ms` after `now`.
    pub fn reset(&mut self, now: u32, duration_ms: u32) {
        debug_assert!(duration_ms <= i32::MAX as u32, "timeout too long: {duration_ms}");
        self.deadline = now.wrapping_add(duration_ms);
        self.expired = false;
    }

    /// Returns `true` once the deadline has passed. Sticky until the next
    /// [`reset`](Self::reset).
    pub fn expired(&mut self, now: u32) -> bool {
        if !self.expired {
            self.expired = (now.wrapping_sub(self.deadline) as i32) >= 0;
        }
        self.expired
    }
}
