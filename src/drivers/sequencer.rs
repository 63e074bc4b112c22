//! Press/release sequencer for the button-pushing servo.
//!
//! ```text
//! Idle ──actuate()──▶ Pressing ──dwell──▶ Releasing ──dwell──▶ Idle
//! ```
//!
//! | Entering    | Side effect                                       |
//! |-------------|---------------------------------------------------|
//! | `Pressing`  | attach, move to pressed angle, settle             |
//! | `Releasing` | move to released angle, settle                    |
//! | `Idle`      | detach (no holding torque, no buzz), short settle |
//!
//! Both dwell legs use the same duration and are armed after the settle, so
//! the button is held for `settle + press_duration`.
//!
//! `actuate()` outside `Idle` is ignored. That is re-entrancy protection, not
//! an error: a press already in flight is never interrupted or doubled.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use super::settle;
use crate::app::ports::ServoPort;
use crate::config::SystemConfig;
use crate::timer::Timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pressing,
    Releasing,
}

pub struct ServoSequencer {
    phase: Phase,
    pressed_angle: u8,
    released_angle: u8,
    press_duration_ms: u32,
    settle_ms: u32,
    detach_settle_ms: u32,
    timer: Timeout,
    cycles: u32,
}

impl ServoSequencer {
    pub fn new(
        pressed_angle: u8,
        released_angle: u8,
        press_duration_ms: u32,
        settle_ms: u32,
        detach_settle_ms: u32,
    ) -> Self {
        Self {
            phase: Phase::Idle,
            pressed_angle,
            released_angle,
            press_duration_ms,
            settle_ms,
            detach_settle_ms,
            timer: Timeout::new(),
            cycles: 0,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.servo_pressed_angle,
            config.servo_released_angle,
            config.servo_press_duration_ms,
            config.servo_settle_ms,
            config.servo_detach_settle_ms,
        )
    }

    /// Start a full press/release cycle. Does nothing unless idle.
    pub fn actuate<H>(&mut self, now: u32, hw: &mut H)
    where
        H: ServoPort + DelayNs,
    {
        if self.phase == Phase::Idle {
            self.enter_pressing(now, hw);
        }
    }

    /// Advance the timer-gated state machine.
    ///
    /// Returns the milliseconds spent settling, so the caller's clock can be
    /// moved past the blocking wait.
    pub fn poll<H>(&mut self, now: u32, hw: &mut H) -> u32
    where
        H: ServoPort + DelayNs,
    {
        if !self.timer.expired(now) {
            return 0;
        }
        match self.phase {
            Phase::Pressing => self.enter_releasing(now, hw),
            Phase::Releasing => self.enter_idle(hw),
            Phase::Idle => 0,
        }
    }

    /// Ready for a new [`actuate`](Self::actuate).
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed-or-started press cycles since boot.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    // ── State entry actions ───────────────────────────────────

    fn enter_pressing<H: ServoPort + DelayNs>(&mut self, now: u32, hw: &mut H) {
        hw.attach();
        hw.write_angle(self.pressed_angle);
        let waited = settle(hw, self.settle_ms);
        info!("servo: pressing (angle={})", self.pressed_angle);
        self.phase = Phase::Pressing;
        self.cycles = self.cycles.wrapping_add(1);
        self.timer.reset(now.wrapping_add(waited), self.press_duration_ms);
    }

    fn enter_releasing<H: ServoPort + DelayNs>(&mut self, now: u32, hw: &mut H) -> u32 {
        hw.write_angle(self.released_angle);
        let waited = settle(hw, self.settle_ms);
        info!("servo: releasing (angle={})", self.released_angle);
        self.phase = Phase::Releasing;
        self.timer.reset(now.wrapping_add(waited), self.press_duration_ms);
        waited
    }

    fn enter_idle<H: ServoPort + DelayNs>(&mut self, hw: &mut H) -> u32 {
        hw.detach();
        let waited = settle(hw, self.detach_settle_ms);
        debug!("servo: detached");
        self.phase = Phase::Idle;
        waited
    }
}
