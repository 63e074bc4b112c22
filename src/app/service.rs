//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the hot-water controller and the bus topic names.
//! It turns inbound bus messages into controller requests and controller
//! events into outbound property updates. All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  bus message ──▶ ┌─────────────────────┐ ──▶ Publisher
//!                  │      AppService      │
//!  LightSensorPort │  HotWaterController  │
//!  ServoPort   ◀──▶└─────────────────────┘
//! ```
//!
//! ## Properties
//!
//! | Topic                   | Direction | Payload                           |
//! |-------------------------|-----------|-----------------------------------|
//! | `<prefix>`              | in + out  | desired state; echoed on change   |
//! | `<prefix>/actual-state` | out       | `true` / `false`                  |
//! | `<prefix>/fault`        | out       | `null`, then a JSON string once   |
//! | `<prefix>/move-servo`   | in        | angle (calibration event)         |

use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use crate::config::SystemConfig;
use crate::drivers::{MAX_SETTLE_MS, settle};
use crate::error::{ConfigError, Error};
use crate::fsm::controller::HotWaterController;

use super::commands::{AppCommand, parse_servo_payload, parse_state_payload};
use super::events::ControllerEvent;
use super::ports::{EventSink, LightSensorPort, Publisher, ServoPort};

/// Longest topic name the service can own.
pub const TOPIC_CAPACITY: usize = 96;

pub type Topic = heapless::String<TOPIC_CAPACITY>;

// ───────────────────────────────────────────────────────────────
// Topics
// ───────────────────────────────────────────────────────────────

/// Topic names derived once from the configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub state: Topic,
    pub actual_state: Topic,
    pub fault: Topic,
    pub move_servo: Topic,
}

impl Topics {
    pub fn new(prefix: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            state: join(prefix, "")?,
            actual_state: join(prefix, "/actual-state")?,
            fault: join(prefix, "/fault")?,
            move_servo: join(prefix, "/move-servo")?,
        })
    }
}

fn join(prefix: &str, suffix: &str) -> Result<Topic, ConfigError> {
    let mut topic = Topic::new();
    topic
        .push_str(prefix)
        .and_then(|()| topic.push_str(suffix))
        .map_err(|()| ConfigError::ValidationFailed("topic_prefix too long"))?;
    Ok(topic)
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    controller: HotWaterController,
    topics: Topics,
    released_angle: u8,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware or the bus. Call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Result<Self, Error> {
        config.validate()?;
        let topics = Topics::new(&config.topic_prefix)?;
        Ok(Self {
            controller: HotWaterController::new(config),
            topics,
            released_angle: config.servo_released_angle,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Park the servo at its released angle and clear the fault property.
    pub fn start<H>(&mut self, hw: &mut H, publisher: &mut impl Publisher)
    where
        H: ServoPort + DelayNs,
    {
        hw.attach();
        hw.write_angle(self.released_angle);
        settle(hw, MAX_SETTLE_MS);
        hw.detach();

        publisher.publish(&self.topics.fault, "null");
        info!("AppService started, watching {}", self.topics.state);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle and publish whatever the controller reported.
    ///
    /// The `hw` parameter satisfies every hardware port at once; this avoids
    /// a double mutable borrow while keeping the port boundary explicit.
    pub fn tick<H>(&mut self, now: u32, hw: &mut H, publisher: &mut impl Publisher)
    where
        H: LightSensorPort + ServoPort + DelayNs,
    {
        let mut sink = PropertySink {
            topics: &self.topics,
            publisher,
        };
        self.controller.poll(now, hw, &mut sink);
    }

    // ── Command handling ──────────────────────────────────────

    /// Map an inbound message to a command. Unknown topics and payloads that
    /// do not parse yield `None`.
    pub fn route(&self, topic: &str, payload: &str) -> Option<AppCommand> {
        if topic == self.topics.state.as_str() {
            parse_state_payload(payload).map(AppCommand::SetHotWater)
        } else if topic == self.topics.move_servo.as_str() {
            parse_servo_payload(payload).map(AppCommand::MoveServo)
        } else {
            debug!("ignoring message on {}", topic);
            None
        }
    }

    /// Deliver one inbound bus message.
    pub fn handle_message<H>(&mut self, topic: &str, payload: &str, hw: &mut H)
    where
        H: LightSensorPort + ServoPort + DelayNs,
    {
        match self.route(topic, payload) {
            Some(cmd) => self.handle_command(cmd, hw),
            None => debug!("dropped {} = {:?}", topic, payload),
        }
    }

    /// Process a parsed command.
    pub fn handle_command<H>(&mut self, cmd: AppCommand, hw: &mut H)
    where
        H: LightSensorPort + ServoPort + DelayNs,
    {
        match cmd {
            AppCommand::SetHotWater(on) => {
                info!("state change requested: {}", on);
                self.controller.request_state(on);
            }
            AppCommand::MoveServo(angle) => {
                self.move_servo(angle, hw);
            }
        }
    }

    /// Calibration: move the servo to `angle` and report the light level.
    ///
    /// Bypasses the state machine entirely. Refused while a press cycle is in
    /// flight. Returns whether the servo was moved.
    pub fn move_servo<H>(&mut self, angle: u8, hw: &mut H) -> bool
    where
        H: LightSensorPort + ServoPort + DelayNs,
    {
        if self.controller.is_actuating() || self.controller.state().pressing_target().is_some() {
            warn!("move-servo refused: controller is {}", self.controller.state());
            return false;
        }
        let angle = angle.min(180);
        hw.attach();
        hw.write_angle(angle);
        info!("moving servo to {} (LDR = {})", angle, hw.read_light_level());
        settle(hw, MAX_SETTLE_MS);
        hw.detach();
        true
    }

    // ── Queries ───────────────────────────────────────────────

    /// `Err(Error::Safety(_))` once the controller has halted on a fault.
    pub fn health(&self) -> Result<(), Error> {
        match self.controller.fault() {
            Some(fault) => Err(fault.into()),
            None => Ok(()),
        }
    }

    pub fn controller(&self) -> &HotWaterController {
        &self.controller
    }

    pub fn topics(&self) -> &Topics {
        &self.topics
    }
}

// ───────────────────────────────────────────────────────────────
// Event → property bridge
// ───────────────────────────────────────────────────────────────

struct PropertySink<'a, P> {
    topics: &'a Topics,
    publisher: &'a mut P,
}

impl<P: Publisher> EventSink for PropertySink<'_, P> {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::StateChanged(on) => {
                let payload = if *on { "true" } else { "false" };
                self.publisher.publish(&self.topics.state, payload);
                self.publisher.publish(&self.topics.actual_state, payload);
            }
            ControllerEvent::Fault(fault) => match serde_json::to_string(fault.message()) {
                Ok(quoted) => self.publisher.publish(&self.topics.fault, &quoted),
                Err(e) => error!("fault not published: {}", e),
            },
        }
    }
}
