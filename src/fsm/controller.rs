//! Closed-loop hot-water controller.
//!
//! Owns the light monitor, the servo sequencer and the safety supervisor and
//! arbitrates between the sensed boiler state and the remotely requested one.
//! Hardware and the owner's reaction to events are injected per call, so the
//! controller holds no global state and no callbacks.
//!
//! ## Per-poll algorithm
//!
//! 1. Advance the sequencer and sample the light monitor.
//! 2. Refill the change quota if its window expired.
//! 3. Report any change in the sensed state (and the initial state on the
//!    first poll) as [`ControllerEvent::StateChanged`].
//! 4. Run the state logic:
//!    - `Idle`: consume the pending request. If it disagrees with the sensed
//!      state, charge the quota (fault when that empties it), start pressing, arm
//!      the rate limit and reset the retry budget.
//!    - `Pressing*`: once the press cycle is complete, verify the sensed state.
//!      Match → `Waiting`; mismatch → press again while retries remain,
//!      otherwise fault.
//!    - `Waiting`: back to `Idle` once the rate limit elapsed.
//!    - faults: nothing, ever.

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use super::StateId;
use crate::app::events::ControllerEvent;
use crate::app::ports::{EventSink, LightSensorPort, ServoPort};
use crate::config::SystemConfig;
use crate::drivers::sequencer::ServoSequencer;
use crate::error::SafetyFault;
use crate::safety::SafetySupervisor;
use crate::sensors::LightMonitor;

pub struct HotWaterController {
    sequencer: ServoSequencer,
    monitor: LightMonitor,
    safety: SafetySupervisor,
    state: StateId,
    /// Latest un-acted-upon request (last write wins).
    request: Option<bool>,
    /// `None` until the first poll, so the initial state is always reported.
    last_observed: Option<bool>,
    n_retries: u32,
    retries_remaining: u32,
}

impl HotWaterController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            sequencer: ServoSequencer::from_config(config),
            monitor: LightMonitor::from_config(config),
            safety: SafetySupervisor::new(config),
            state: StateId::Idle,
            request: None,
            last_observed: None,
            n_retries: config.n_retries,
            retries_remaining: config.n_retries,
        }
    }

    /// Record the desired hot-water state. Acted upon by a later
    /// [`poll`](Self::poll) once the controller is idle.
    pub fn request_state(&mut self, desired: bool) {
        if let Some(previous) = self.request.replace(desired) {
            if previous != desired {
                debug!("controller: request {} superseded by {}", previous, desired);
            }
        }
    }

    /// Run one control cycle. The only place the controller changes state.
    pub fn poll<H>(&mut self, now: u32, hw: &mut H, sink: &mut impl EventSink)
    where
        H: LightSensorPort + ServoPort + DelayNs,
    {
        // 1. Sub-components. The sequencer may have blocked in a settle;
        //    everything after it runs on the later clock.
        let now = now.wrapping_add(self.sequencer.poll(now, hw));
        self.monitor.poll(now, hw);

        // 2. Quota window
        self.safety.refresh(now);

        // 3. Report ground truth
        let sensed = self.monitor.state();
        if self.last_observed != Some(sensed) {
            self.last_observed = Some(sensed);
            info!("controller: boiler hot water is {}", if sensed { "on" } else { "off" });
            sink.emit(&ControllerEvent::StateChanged(sensed));
        }

        // 4. State logic
        match self.state {
            StateId::Idle => self.update_idle(now, sensed, hw, sink),
            StateId::PressingOn | StateId::PressingOff => self.update_pressing(now, sensed, hw, sink),
            StateId::Waiting => {
                if self.safety.rate_limit_elapsed(now) {
                    self.transition(StateId::Idle);
                }
            }
            StateId::FaultRateLimit | StateId::FaultPressFailed => {}
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.state
    }

    /// Last reported boiler state, `None` before the first poll.
    pub fn sensed_state(&self) -> Option<bool> {
        self.last_observed
    }

    pub fn pending_request(&self) -> Option<bool> {
        self.request
    }

    pub fn fault(&self) -> Option<SafetyFault> {
        self.state.fault()
    }

    pub fn changes_remaining(&self) -> u32 {
        self.safety.changes_remaining()
    }

    pub fn retries_remaining(&self) -> u32 {
        self.retries_remaining
    }

    /// The servo is somewhere in a press/release cycle.
    pub fn is_actuating(&self) -> bool {
        !self.sequencer.is_idle()
    }

    /// Press cycles started since boot (including retries).
    pub fn press_count(&self) -> u32 {
        self.sequencer.cycles()
    }

    /// Most recent raw light level.
    pub fn light_level(&self) -> Option<u16> {
        self.monitor.last_level()
    }

    // ── State handlers ────────────────────────────────────────

    fn update_idle<H>(&mut self, now: u32, sensed: bool, hw: &mut H, sink: &mut impl EventSink)
    where
        H: ServoPort + DelayNs,
    {
        let Some(desired) = self.request.take() else {
            return;
        };
        if desired == sensed {
            debug!("controller: request {} already satisfied", desired);
            return;
        }

        if let Err(fault) = self.safety.try_charge() {
            self.enter_fault(fault, sink);
            return;
        }

        self.transition(StateId::pressing(desired));
        self.sequencer.actuate(now, hw);
        self.safety.arm_rate_limit(now);
        self.retries_remaining = self.n_retries;
    }

    fn update_pressing<H>(&mut self, now: u32, sensed: bool, hw: &mut H, sink: &mut impl EventSink)
    where
        H: ServoPort + DelayNs,
    {
        if !self.sequencer.is_idle() {
            return;
        }
        if self.state.pressing_target() == Some(sensed) {
            self.transition(StateId::Waiting);
        } else if self.retries_remaining > 0 {
            self.retries_remaining -= 1;
            warn!(
                "controller: boiler did not follow press, retrying ({} left)",
                self.retries_remaining
            );
            self.sequencer.actuate(now, hw);
        } else {
            self.enter_fault(SafetyFault::PressFailed, sink);
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn enter_fault(&mut self, fault: SafetyFault, sink: &mut impl EventSink) {
        let next = match fault {
            SafetyFault::RateLimitReached => StateId::FaultRateLimit,
            SafetyFault::PressFailed => StateId::FaultPressFailed,
        };
        self.transition(next);
        error!("controller: FATAL: {}", fault);
        sink.emit(&ControllerEvent::Fault(fault));
    }

    fn transition(&mut self, next: StateId) {
        debug_assert!(!self.state.is_terminal(), "left terminal state {}", self.state);
        info!("controller: {} -> {}", self.state, next);
        self.state = next;
    }
}
