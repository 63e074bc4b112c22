//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ HotWaterController / AppService (domain)
//! ```
//!
//! Driven adapters (light sensor, servo, event sinks, bus publisher) implement
//! these traits. The domain consumes them via generics, so the controller never
//! touches hardware directly and runs unchanged against the mocks in `tests/`.
//!
//! Settle delays are not a port of their own: the servo path takes any
//! [`embedded_hal::delay::DelayNs`] and bounds it through
//! [`drivers::settle`](crate::drivers::settle).

use super::events::ControllerEvent;

// ───────────────────────────────────────────────────────────────
// Light sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: raw analog level of the LDR watching the boiler LED.
pub trait LightSensorPort {
    /// One ADC conversion. Cheap, non-blocking.
    fn read_light_level(&mut self) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Servo port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the hobby servo pressing the boiler's button.
pub trait ServoPort {
    /// Start driving the servo (enables pulse output).
    fn attach(&mut self);

    /// Command an absolute angle (0–180 degrees).
    fn write_angle(&mut self, degrees: u8);

    /// Stop driving the servo entirely; it holds no torque afterwards.
    fn detach(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → owner)
// ───────────────────────────────────────────────────────────────

/// The controller reports observable transitions through this port.
///
/// Replaces the board's global state-change and fault callbacks: whoever owns
/// the controller passes a sink into every `poll` and reacts to the events.
pub trait EventSink {
    fn emit(&mut self, event: &ControllerEvent);
}

// ───────────────────────────────────────────────────────────────
// Publisher port (driven adapter: domain → pub/sub bus)
// ───────────────────────────────────────────────────────────────

/// Outbound half of the pub/sub transport: set a property to a JSON payload.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str);
}
