//! Outbound controller events.
//!
//! The [`HotWaterController`](crate::fsm::controller::HotWaterController)
//! emits these through the [`EventSink`](super::ports::EventSink) port.
//! At most one of each kind is emitted per `poll`, state change first.

use crate::error::SafetyFault;

/// Structured events emitted by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// The light sensor now reports the boiler as on (`true`) or off.
    ///
    /// Emitted for every observed transition, requested or not, and once on
    /// the first poll so the owner learns the initial state.
    StateChanged(bool),

    /// The controller entered a terminal fault state. Emitted exactly once.
    Fault(SafetyFault),
}
