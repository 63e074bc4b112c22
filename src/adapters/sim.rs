//! Simulated boiler for the host build.
//!
//! Stands in for the whole bathroom installation: a boiler whose hot-water
//! LED toggles each time its button goes down, the LDR taped over that LED,
//! and the servo pushing the button. Blocking settle delays advance the
//! simulated clock instead of sleeping, so a script of hours runs instantly.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::app::ports::{LightSensorPort, ServoPort};

/// LDR level with the LED lit (covered LDR reads low).
pub const LEVEL_LED_ON: u16 = 200;
/// LDR level with the LED dark.
pub const LEVEL_LED_OFF: u16 = 1000;

/// Servo angle from which the horn holds the button down.
const BUTTON_DOWN_ANGLE: u8 = 45;

pub struct SimBoiler {
    now_ms: u32,
    sub_ms_ns: u32,
    hot_water: bool,
    responsive: bool,
    attached: bool,
    angle: u8,
    button_down: bool,
    presses: u32,
}

impl SimBoiler {
    pub fn new(hot_water: bool) -> Self {
        Self {
            now_ms: 0,
            sub_ms_ns: 0,
            hot_water,
            responsive: true,
            attached: false,
            angle: 0,
            button_down: false,
            presses: 0,
        }
    }

    /// Start the clock somewhere other than zero (e.g. just before a wrap).
    pub fn with_clock(mut self, now_ms: u32) -> Self {
        self.now_ms = now_ms;
        self
    }

    pub fn now_ms(&self) -> u32 {
        self.now_ms
    }

    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    pub fn hot_water(&self) -> bool {
        self.hot_water
    }

    /// A broken boiler ignores its button.
    pub fn set_responsive(&mut self, responsive: bool) {
        self.responsive = responsive;
    }

    /// Someone pressed the button by hand.
    pub fn toggle_by_hand(&mut self) {
        self.hot_water = !self.hot_water;
    }

    /// Times the servo pushed the button down.
    pub fn presses(&self) -> u32 {
        self.presses
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    fn update_button(&mut self) {
        let down = self.attached && self.angle >= BUTTON_DOWN_ANGLE;
        if down && !self.button_down {
            self.presses += 1;
            if self.responsive {
                self.hot_water = !self.hot_water;
            }
            debug!("sim: button down (hot water {})", self.hot_water);
        }
        self.button_down = down;
    }
}

impl LightSensorPort for SimBoiler {
    fn read_light_level(&mut self) -> u16 {
        if self.hot_water { LEVEL_LED_ON } else { LEVEL_LED_OFF }
    }
}

impl ServoPort for SimBoiler {
    fn attach(&mut self) {
        self.attached = true;
        self.update_button();
    }

    fn write_angle(&mut self, degrees: u8) {
        self.angle = degrees.min(180);
        self.update_button();
    }

    fn detach(&mut self) {
        // An unpowered horn stays where it is but no longer holds the button.
        self.attached = false;
        self.update_button();
    }
}

impl DelayNs for SimBoiler {
    fn delay_ns(&mut self, ns: u32) {
        let total = u64::from(self.sub_ms_ns) + u64::from(ns);
        self.advance((total / 1_000_000) as u32);
        self.sub_ms_ns = (total % 1_000_000) as u32;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}
