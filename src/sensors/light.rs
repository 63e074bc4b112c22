//! Hysteresis monitor for the LDR taped over the boiler's status LED.
//!
//! The LED sits behind analog noise (ambient light, ADC jitter), so a single
//! threshold would chatter. The monitor keeps a dead band between two
//! thresholds: the raw state only rises on a reading `>= high` and only falls
//! on a reading `<= low`. Readings strictly in between never change it.
//!
//! The very first sample has no history and sets the raw state directly from
//! `reading >= high`.
//!
//! Sampling is self-throttled by a [`Timeout`], so calling [`poll`] faster
//! than the sample period is harmless.
//!
//! [`poll`]: LightMonitor::poll

use log::debug;

use crate::app::ports::LightSensorPort;
use crate::config::SystemConfig;
use crate::timer::Timeout;

pub struct LightMonitor {
    low_threshold: u16,
    high_threshold: u16,
    inverted: bool,
    sample_period_ms: u32,
    sample_timer: Timeout,
    initialised: bool,
    /// Debounced state before inversion.
    raw_state: bool,
    last_level: Option<u16>,
}

impl LightMonitor {
    pub fn new(low_threshold: u16, high_threshold: u16, inverted: bool, sample_period_ms: u32) -> Self {
        debug_assert!(low_threshold <= high_threshold);
        Self {
            low_threshold,
            high_threshold,
            inverted,
            sample_period_ms,
            sample_timer: Timeout::new(),
            initialised: false,
            raw_state: false,
            last_level: None,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            config.ldr_low_threshold,
            config.ldr_high_threshold,
            config.ldr_inverted,
            config.ldr_sample_period_ms,
        )
    }

    /// Sample the sensor if the sample period has elapsed.
    pub fn poll(&mut self, now: u32, sensor: &mut impl LightSensorPort) {
        if self.sample_timer.expired(now) {
            let level = sensor.read_light_level();
            self.apply_reading(level);
            self.sample_timer.reset(now, self.sample_period_ms);
        }
    }

    /// Current debounced state with inversion applied. Does not sample.
    pub fn state(&self) -> bool {
        self.raw_state ^ self.inverted
    }

    /// Whether at least one sample has been taken.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Most recent raw ADC level, if any.
    pub fn last_level(&self) -> Option<u16> {
        self.last_level
    }

    fn apply_reading(&mut self, level: u16) {
        self.last_level = Some(level);

        if !self.initialised {
            self.raw_state = level >= self.high_threshold;
            self.initialised = true;
            debug!("ldr: initial level={} raw={}", level, self.raw_state);
            return;
        }

        let before = self.raw_state;
        if level >= self.high_threshold {
            self.raw_state = true;
        } else if level <= self.low_threshold {
            self.raw_state = false;
        }
        if before != self.raw_state {
            debug!("ldr: level={} raw {} -> {}", level, before, self.raw_state);
        }
    }
}
