//! System configuration parameters
//!
//! All tunable parameters for the hot-water controller and its bus surface.
//! Defaults match the bathroom board as installed; a JSON document can
//! override any subset of them.

use serde::{Deserialize, Serialize};

use crate::drivers::MAX_SETTLE_MS;
use crate::error::ConfigError;

/// Longest duration a [`Timeout`](crate::timer::Timeout) can represent.
pub const MAX_TIMER_MS: u32 = i32::MAX as u32;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Light sensor (boiler status LED) ---
    /// ADC level at or below which the raw state falls to `false`
    pub ldr_low_threshold: u16,
    /// ADC level at or above which the raw state rises to `true`
    pub ldr_high_threshold: u16,
    /// A low reading means the boiler is on
    pub ldr_inverted: bool,
    /// Minimum interval between ADC samples (milliseconds)
    pub ldr_sample_period_ms: u32,

    // --- Servo ---
    /// Servo angle while the button is released (degrees)
    pub servo_released_angle: u8,
    /// Servo angle while the button is held down (degrees)
    pub servo_pressed_angle: u8,
    /// Dwell in each of the press and release legs (milliseconds)
    pub servo_press_duration_ms: u32,
    /// Blocking settle after each servo move (milliseconds)
    pub servo_settle_ms: u32,
    /// Blocking settle after detaching the servo (milliseconds)
    pub servo_detach_settle_ms: u32,
    /// Pulse width at 0 degrees (microseconds)
    pub servo_min_pulse_us: u16,
    /// Pulse width at 180 degrees (microseconds)
    pub servo_max_pulse_us: u16,

    // --- Safety policy ---
    /// Minimum time between consecutive reconciliations (milliseconds)
    pub rate_limit_ms: u32,
    /// Quota units per change window; the attempt that spends the last one faults
    pub n_changes: u32,
    /// Length of the change window (milliseconds)
    pub change_window_ms: u32,
    /// Extra presses allowed when the boiler does not follow the first one
    pub n_retries: u32,

    // --- Bus ---
    /// Topic prefix for every property this board owns
    pub topic_prefix: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Light sensor
            ldr_low_threshold: 500,
            ldr_high_threshold: 800,
            ldr_inverted: true,
            ldr_sample_period_ms: 100,

            // Servo
            servo_released_angle: 0,
            servo_pressed_angle: 70,
            servo_press_duration_ms: 500,
            servo_settle_ms: 500,
            servo_detach_settle_ms: 100,
            servo_min_pulse_us: 450,
            servo_max_pulse_us: 2450,

            // Safety policy
            rate_limit_ms: 30 * 1000,              // 30 s
            n_changes: 10,
            change_window_ms: 10 * 60 * 60 * 1000, // 10 h
            n_retries: 5,

            // Bus
            topic_prefix: "heating/hot_water".into(),
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            log::warn!("config parse failed: {}", e);
            ConfigError::Malformed
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the controller unsafe or meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ldr_low_threshold > self.ldr_high_threshold {
            return Err(ConfigError::ValidationFailed(
                "ldr_low_threshold must not exceed ldr_high_threshold",
            ));
        }
        if self.ldr_sample_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("ldr_sample_period_ms must be > 0"));
        }
        if self.servo_pressed_angle > 180 || self.servo_released_angle > 180 {
            return Err(ConfigError::ValidationFailed("servo angles must be 0-180"));
        }
        if self.servo_min_pulse_us >= self.servo_max_pulse_us {
            return Err(ConfigError::ValidationFailed(
                "servo_min_pulse_us must be below servo_max_pulse_us",
            ));
        }
        if self.servo_press_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed("servo_press_duration_ms must be > 0"));
        }
        if self.servo_settle_ms > MAX_SETTLE_MS || self.servo_detach_settle_ms > MAX_SETTLE_MS {
            return Err(ConfigError::ValidationFailed("servo settle exceeds MAX_SETTLE_MS"));
        }
        // The unit that empties the quota faults instead of pressing.
        if self.n_changes < 2 {
            return Err(ConfigError::ValidationFailed("n_changes must be at least 2"));
        }
        if self.change_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("change_window_ms must be > 0"));
        }
        let timers = [
            self.ldr_sample_period_ms,
            self.servo_press_duration_ms,
            self.rate_limit_ms,
            self.change_window_ms,
        ];
        if timers.iter().any(|&ms| ms > MAX_TIMER_MS) {
            return Err(ConfigError::ValidationFailed("timer duration exceeds 2^31 ms"));
        }
        if self.topic_prefix.is_empty() {
            return Err(ConfigError::ValidationFailed("topic_prefix must not be empty"));
        }
        Ok(())
    }
}
