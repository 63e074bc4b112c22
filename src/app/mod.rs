//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the boiler bridge: bus
//! message interpretation, controller orchestration and property
//! publication. All interaction with hardware and the bus happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
