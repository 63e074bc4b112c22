//! Sensor subsystem.
//!
//! The bathroom board has a single sensor: an LDR watching the boiler's
//! "hot water on" LED, debounced by [`light::LightMonitor`].

pub mod light;

pub use light::LightMonitor;
