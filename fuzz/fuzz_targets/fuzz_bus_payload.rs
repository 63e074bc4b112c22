//! Fuzz target: inbound bus payloads
//!
//! Feeds arbitrary text to both payload parsers and through a live
//! `AppService`, checking:
//! - No panics under any input
//! - Blank payloads never produce a request
//! - Servo angles never leave 0–180
//!
//! cargo fuzz run fuzz_bus_payload

#![no_main]

use boilerbridge::app::commands::{parse_servo_payload, parse_state_payload};
use boilerbridge::app::ports::{LightSensorPort, ServoPort};
use boilerbridge::app::service::AppService;
use boilerbridge::config::SystemConfig;
use embedded_hal::delay::DelayNs;
use libfuzzer_sys::fuzz_target;

struct NullHw;

impl LightSensorPort for NullHw {
    fn read_light_level(&mut self) -> u16 {
        512
    }
}

impl ServoPort for NullHw {
    fn attach(&mut self) {}
    fn write_angle(&mut self, degrees: u8) {
        assert!(degrees <= 180);
    }
    fn detach(&mut self) {}
}

impl DelayNs for NullHw {
    fn delay_ns(&mut self, _ns: u32) {}
}

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = core::str::from_utf8(data) else {
        return;
    };

    let state = parse_state_payload(payload);
    assert_eq!(state.is_none(), payload.trim_start().is_empty());

    if let Some(angle) = parse_servo_payload(payload) {
        assert!(angle <= 180);
    }

    let mut app = AppService::new(&SystemConfig::default()).unwrap();
    let mut hw = NullHw;
    app.handle_message("heating/hot_water", payload, &mut hw);
    app.handle_message("heating/hot_water/move-servo", payload, &mut hw);
    assert_eq!(app.controller().pending_request(), state);
});
