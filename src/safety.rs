//! Safety supervisor: change quota and rate limit.
//!
//! Two independent policies protect the boiler's button from a misbehaving
//! remote client:
//!
//! 1. **Quota**: `n_changes` units per `change_window_ms`. Each
//!    reconciliation attempt spends one unit before any retries, never one
//!    per physical press. The attempt that spends the last unit does not
//!    actuate; it is a terminal fault. So at most `n_changes - 1` attempts
//!    press the button per window.
//! 2. **Rate limit**: after a verified change the controller waits
//!    `rate_limit_ms` (measured from the start of the attempt) before it
//!    evaluates the next request.
//!
//! The quota refills only when the window timer expires. The window timer
//! starts expired, so the first [`refresh`](SafetySupervisor::refresh) fills
//! the quota and opens the first window.

use log::{error, info};

use crate::config::SystemConfig;
use crate::error::SafetyFault;
use crate::timer::Timeout;

pub struct SafetySupervisor {
    n_changes: u32,
    changes_remaining: u32,
    change_window_ms: u32,
    window_timer: Timeout,
    rate_limit_ms: u32,
    rate_limit_timer: Timeout,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            n_changes: config.n_changes,
            changes_remaining: 0,
            change_window_ms: config.change_window_ms,
            window_timer: Timeout::new(),
            rate_limit_ms: config.rate_limit_ms,
            rate_limit_timer: Timeout::new(),
        }
    }

    /// Refill the quota if the change window has elapsed.
    pub fn refresh(&mut self, now: u32) {
        if self.window_timer.expired(now) {
            if self.changes_remaining != self.n_changes {
                info!("safety: change quota reset to {}", self.n_changes);
            }
            self.changes_remaining = self.n_changes;
            self.window_timer.reset(now, self.change_window_ms);
        }
    }

    /// Charge one reconciliation attempt against the quota. Fails when this
    /// spends the last unit.
    pub fn try_charge(&mut self) -> Result<(), SafetyFault> {
        self.changes_remaining = self.changes_remaining.saturating_sub(1);
        if self.changes_remaining == 0 {
            error!("SAFETY FAULT: {}", SafetyFault::RateLimitReached);
            return Err(SafetyFault::RateLimitReached);
        }
        Ok(())
    }

    /// Start the minimum dwell before the next reconciliation.
    pub fn arm_rate_limit(&mut self, now: u32) {
        self.rate_limit_timer.reset(now, self.rate_limit_ms);
    }

    pub fn rate_limit_elapsed(&mut self, now: u32) -> bool {
        self.rate_limit_timer.expired(now)
    }

    /// Attempts left in the current window.
    pub fn changes_remaining(&self) -> u32 {
        self.changes_remaining
    }
}
