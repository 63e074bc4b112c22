//! Hobby servo on an `embedded-hal` PWM channel.
//!
//! Standard 50 Hz servo framing: one pulse every 20 ms whose width encodes
//! the angle. The pulse range is configurable because the cheap servo on the
//! boiler needs a wider range (450–2450 µs) than the nominal 1000–2000 µs.
//!
//! ## Safety contract
//!
//! This is a dumb actuator. Whether the servo may move at all is decided by
//! the [`ServoSequencer`](super::sequencer::ServoSequencer) and the controller.
//! PWM errors are logged and swallowed: the controller's press verification
//! catches a servo that did not move.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ServoPort;
use crate::config::SystemConfig;

/// Servo frame period (microseconds).
pub const FRAME_US: u32 = 20_000;

pub struct PwmServo<P> {
    pwm: P,
    min_pulse_us: u16,
    max_pulse_us: u16,
    attached: bool,
    angle: u8,
}

impl<P: SetDutyCycle> PwmServo<P> {
    /// Bounds given the wrong way round are swapped.
    pub fn new(pwm: P, min_pulse_us: u16, max_pulse_us: u16) -> Self {
        let (min_pulse_us, max_pulse_us) = if min_pulse_us <= max_pulse_us {
            (min_pulse_us, max_pulse_us)
        } else {
            warn!("servo: pulse bounds {}..{} inverted, swapping", min_pulse_us, max_pulse_us);
            (max_pulse_us, min_pulse_us)
        };
        Self {
            pwm,
            min_pulse_us,
            max_pulse_us,
            attached: false,
            angle: 0,
        }
    }

    pub fn from_config(pwm: P, config: &SystemConfig) -> Self {
        Self::new(pwm, config.servo_min_pulse_us, config.servo_max_pulse_us)
    }

    /// Pulse width for `degrees`, clamped to 180.
    pub fn pulse_us(&self, degrees: u8) -> u32 {
        let degrees = u32::from(degrees.min(180));
        let span = u32::from(self.max_pulse_us - self.min_pulse_us);
        u32::from(self.min_pulse_us) + span * degrees / 180
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Last commanded angle.
    pub fn angle(&self) -> u8 {
        self.angle
    }

    fn apply(&mut self) {
        let max = u32::from(self.pwm.max_duty_cycle());
        let duty = (max * self.pulse_us(self.angle) / FRAME_US) as u16;
        if let Err(e) = self.pwm.set_duty_cycle(duty) {
            warn!("servo: PWM write failed: {:?}", e);
        }
    }
}

impl<P: SetDutyCycle> ServoPort for PwmServo<P> {
    fn attach(&mut self) {
        self.attached = true;
        self.apply();
    }

    fn write_angle(&mut self, degrees: u8) {
        self.angle = degrees.min(180);
        if self.attached {
            self.apply();
        }
    }

    fn detach(&mut self) {
        self.attached = false;
        if let Err(e) = self.pwm.set_duty_cycle_fully_off() {
            warn!("servo: PWM off failed: {:?}", e);
        }
    }
}
