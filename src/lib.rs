//! Boiler bridge library.
//!
//! Closes the loop around a boiler that only offers a push button and a
//! status LED: an LDR watches the LED, a servo pushes the button, and the
//! [`HotWaterController`](fsm::controller::HotWaterController) reconciles the
//! two with a requested state under a strict safety policy. [`app`] exposes
//! it on a pub/sub bus; [`radio`] bridges 433 MHz remote-control codes onto
//! the same bus.
//!
//! Everything here is pure logic behind the port traits in [`app::ports`],
//! so it runs unchanged on the host against the simulator and the mocks in
//! `tests/`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod radio;
pub mod safety;
pub mod sensors;
pub mod timer;
