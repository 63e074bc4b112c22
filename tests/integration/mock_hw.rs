//! Mock hardware adapter for integration tests.
//!
//! Records every servo call so tests can assert on the full command history
//! without touching real PWM registers. The boiler toggles when the servo
//! pushes its button; blocking delays advance the mock clock.

use boilerbridge::app::events::ControllerEvent;
use boilerbridge::app::ports::{EventSink, LightSensorPort, Publisher, ServoPort};
use boilerbridge::fsm::controller::HotWaterController;
use embedded_hal::delay::DelayNs;

pub const LEVEL_ON: u16 = 150;
pub const LEVEL_OFF: u16 = 950;
pub const PRESSED_ANGLE: u8 = 70;

/// Poll period used by the helpers below.
pub const STEP_MS: u32 = 10;

// ── Servo call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCall {
    Attach,
    Write(u8),
    Detach,
    Delay(u32),
}

// ── MockBoiler ────────────────────────────────────────────────

pub struct MockBoiler {
    pub now: u32,
    pub hot_water: bool,
    /// When false, button presses have no effect.
    pub responsive: bool,
    /// This many presses are swallowed before the boiler starts responding.
    pub ignore_presses: u32,
    pub calls: Vec<ServoCall>,
    /// `(now, angle)` for every servo write.
    pub moves: Vec<(u32, u8)>,
    pub presses: u32,
    attached: bool,
}

#[allow(dead_code)]
impl MockBoiler {
    pub fn new(hot_water: bool) -> Self {
        Self {
            now: 0,
            hot_water,
            responsive: true,
            ignore_presses: 0,
            calls: Vec::new(),
            moves: Vec::new(),
            presses: 0,
            attached: false,
        }
    }

    pub fn starting_at(mut self, now: u32) -> Self {
        self.now = now;
        self
    }

    pub fn unresponsive(mut self) -> Self {
        self.responsive = false;
        self
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// How long each press was held: pressed write to the following write.
    pub fn hold_times(&self) -> Vec<u32> {
        self.moves
            .windows(2)
            .filter(|w| w[0].1 == PRESSED_ANGLE)
            .map(|w| w[1].0.wrapping_sub(w[0].0))
            .collect()
    }

    pub fn servo_writes(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ServoCall::Write(a) => Some(*a),
                _ => None,
            })
            .collect()
    }
}

impl LightSensorPort for MockBoiler {
    fn read_light_level(&mut self) -> u16 {
        if self.hot_water { LEVEL_ON } else { LEVEL_OFF }
    }
}

impl ServoPort for MockBoiler {
    fn attach(&mut self) {
        self.attached = true;
        self.calls.push(ServoCall::Attach);
    }

    fn write_angle(&mut self, degrees: u8) {
        self.calls.push(ServoCall::Write(degrees));
        self.moves.push((self.now, degrees));
        if self.attached && degrees == PRESSED_ANGLE {
            self.presses += 1;
            if self.ignore_presses > 0 {
                self.ignore_presses -= 1;
            } else if self.responsive {
                self.hot_water = !self.hot_water;
            }
        }
    }

    fn detach(&mut self) {
        self.attached = false;
        self.calls.push(ServoCall::Detach);
    }
}

impl DelayNs for MockBoiler {
    fn delay_ns(&mut self, ns: u32) {
        self.now = self.now.wrapping_add(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ServoCall::Delay(ms));
        self.now = self.now.wrapping_add(ms);
    }
}

// ── Recording sinks ───────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ControllerEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ControllerEvent) {
        self.events.push(*event);
    }
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn faults(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::Fault(_)))
            .count()
    }

    pub fn state_changes(&self) -> Vec<bool> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ControllerEvent::StateChanged(on) => Some(*on),
                ControllerEvent::Fault(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub published: Vec<(String, String)>,
}

#[allow(dead_code)]
impl RecordingPublisher {
    pub fn on(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&mut self, topic: &str, payload: &str) {
        self.published.push((topic.to_owned(), payload.to_owned()));
    }
}

// ── Drivers ───────────────────────────────────────────────────

/// Poll every [`STEP_MS`] for `ms` of mock time (settle delays included).
#[allow(dead_code)]
pub fn run_for(c: &mut HotWaterController, hw: &mut MockBoiler, sink: &mut RecordingSink, ms: u32) {
    let end = hw.now.wrapping_add(ms);
    while (end.wrapping_sub(hw.now) as i32) > 0 {
        c.poll(hw.now, hw, sink);
        hw.now = hw.now.wrapping_add(STEP_MS);
    }
}
