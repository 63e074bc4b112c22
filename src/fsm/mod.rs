//! Hot-water controller state machine.
//!
//! ```text
//!                 request ≠ sensed
//!   ┌──────┐  (quota available)   ┌────────────────────────┐
//!   │ Idle │ ───────────────────▶ │ PressingOn/PressingOff │ ◀─┐ retry
//!   └──────┘                      └────────────────────────┘ ──┘
//!     ▲  │ quota exhausted              │ sensed == target │ retries exhausted
//!     │  ▼                              ▼                  ▼
//!     │ ┌────────────────┐        ┌─────────┐   ┌──────────────────┐
//!     │ │ FaultRateLimit │        │ Waiting │   │ FaultPressFailed │
//!     │ └────────────────┘        └─────────┘   └──────────────────┘
//!     └──────── rate limit elapsed ───┘
//! ```
//!
//! Both fault states are terminal. See [`controller`] for the per-poll
//! algorithm.

pub mod controller;

use crate::error::SafetyFault;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Enumeration of all controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Waiting for a request that disagrees with the sensed state.
    Idle = 0,
    /// Pressing the button to turn hot water on.
    PressingOn = 1,
    /// Pressing the button to turn hot water off.
    PressingOff = 2,
    /// Change verified; waiting out the rate limit.
    Waiting = 3,
    /// Change quota exhausted. Terminal.
    FaultRateLimit = 4,
    /// Button presses had no effect. Terminal.
    FaultPressFailed = 5,
}

impl StateId {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PressingOn => "pressing_on",
            Self::PressingOff => "pressing_off",
            Self::Waiting => "waiting",
            Self::FaultRateLimit => "fault_rate_limit",
            Self::FaultPressFailed => "fault_press_failed",
        }
    }

    /// No transition ever leaves a terminal state.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::FaultRateLimit | Self::FaultPressFailed)
    }

    /// Target boiler state while pressing, `None` otherwise.
    pub const fn pressing_target(self) -> Option<bool> {
        match self {
            Self::PressingOn => Some(true),
            Self::PressingOff => Some(false),
            _ => None,
        }
    }

    /// The fault a terminal state represents.
    pub const fn fault(self) -> Option<SafetyFault> {
        match self {
            Self::FaultRateLimit => Some(SafetyFault::RateLimitReached),
            Self::FaultPressFailed => Some(SafetyFault::PressFailed),
            _ => None,
        }
    }

    pub const fn pressing(target: bool) -> Self {
        if target { Self::PressingOn } else { Self::PressingOff }
    }
}

impl core::fmt::Display for StateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
