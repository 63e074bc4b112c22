//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                 |
//! |------------|--------------------|-----------------------------|
//! | `log_sink` | Publisher          | Log output                  |
//! | `sim`      | LightSensorPort    | Simulated boiler LED        |
//! |            | ServoPort, DelayNs | Simulated button and clock  |
//!
//! On the board itself the servo is a
//! [`PwmServo`](crate::drivers::servo::PwmServo) over the HAL's PWM channel.

pub mod log_sink;
pub mod sim;
