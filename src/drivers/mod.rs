//! Actuator drivers and the bounded settle primitive.
//!
//! ## Blocking
//!
//! The control loop is cooperative and `poll` must not block, with one
//! deliberate exception: after commanding the servo the firmware waits a short
//! fixed time for the horn to physically arrive. That wait goes through
//! [`settle`] and nowhere else, and it is clamped to [`MAX_SETTLE_MS`], so the
//! worst-case stall of a single poll is known.

pub mod sequencer;
pub mod servo;

use embedded_hal::delay::DelayNs;

/// Upper bound for any single blocking settle (milliseconds).
pub const MAX_SETTLE_MS: u32 = 500;

/// Block for `ms` milliseconds, clamped to [`MAX_SETTLE_MS`].
///
/// Returns the number of milliseconds actually waited so callers can arm
/// timers relative to the end of the wait.
pub fn settle(delay: &mut impl DelayNs, ms: u32) -> u32 {
    let ms = ms.min(MAX_SETTLE_MS);
    if ms > 0 {
        delay.delay_ms(ms);
    }
    ms
}
