//! Integration tests for the 433 MHz bridge: registry properties in,
//! code events and transmissions out.

use boilerbridge::error::{Error, RegistryError};
use boilerbridge::radio::{RX_CODES_TOPIC, RX_UNKNOWN_TOPIC, RadioBridge, TX_CODES_TOPIC};

use super::mock_hw::RecordingPublisher;

#[test]
fn learned_rx_code_fires_its_event() {
    let mut radio = RadioBridge::new();
    let mut publisher = RecordingPublisher::default();
    assert!(radio.handle_message(RX_CODES_TOPIC, r#"{"doorbell/ring": [5592405, 24]}"#, &mut publisher));

    radio.receive(0, 5_592_405, 24, &mut publisher);
    radio.receive(150, 5_592_405, 24, &mut publisher);
    radio.receive(3_100, 5_592_405, 24, &mut publisher);

    assert_eq!(publisher.on("doorbell/ring"), vec!["null", "null"]);
    assert!(publisher.on(RX_UNKNOWN_TOPIC).is_empty());
}

#[test]
fn unknown_code_reported_after_four_repeats() {
    let mut radio = RadioBridge::new();
    let mut publisher = RecordingPublisher::default();
    for t in 0..6 {
        radio.receive(t * 100, 1234, 24, &mut publisher);
    }
    assert_eq!(publisher.on(RX_UNKNOWN_TOPIC), vec!["[1234,24]"]);
}

#[test]
fn malformed_table_keeps_previous_registry() {
    let mut radio = RadioBridge::new();
    let mut publisher = RecordingPublisher::default();
    radio.handle_message(RX_CODES_TOPIC, r#"{"a": [1, 24]}"#, &mut publisher);
    assert!(radio.handle_message(RX_CODES_TOPIC, r#"{"a": [1, true]}"#, &mut publisher));
    assert_eq!(radio.rx().codes().len(), 1);
}

#[test]
fn tx_properties_queue_codes() {
    let mut radio = RadioBridge::new();
    let mut publisher = RecordingPublisher::default();
    radio.handle_message(
        TX_CODES_TOPIC,
        r#"{"lights/lamp": [100, 101, 24], "lights/fan": [200, 201, 24]}"#,
        &mut publisher,
    );
    assert_eq!(publisher.on("lights/lamp"), vec!["null"]);
    assert_eq!(publisher.on("lights/fan"), vec!["null"]);

    assert!(radio.handle_message("lights/fan", "true", &mut publisher));
    assert!(radio.handle_message("lights/lamp", "1", &mut publisher), "ours, but ignored");
    assert!(!radio.handle_message("lights/other", "true", &mut publisher));

    assert_eq!(radio.next_transmission(), Some((200, 24)));
    assert_eq!(radio.next_transmission(), None);
}

#[test]
fn replacing_tx_table_deletes_old_properties() {
    let mut radio = RadioBridge::new();
    let mut publisher = RecordingPublisher::default();
    radio.handle_message(TX_CODES_TOPIC, r#"{"old": [1, 2, 24]}"#, &mut publisher);
    radio.handle_message("old", "true", &mut publisher);
    radio.handle_message(TX_CODES_TOPIC, r#"{"new": [3, 4, 24]}"#, &mut publisher);

    assert_eq!(publisher.on("old"), vec!["null", ""]);
    assert_eq!(publisher.on("new"), vec!["null"]);
    assert_eq!(radio.next_transmission(), None, "pending requests dropped");
}

#[test]
fn loaders_report_why_a_table_was_rejected() {
    let mut radio = RadioBridge::new();
    let mut publisher = RecordingPublisher::default();
    assert_eq!(radio.load_rx_codes(r#"{"a": [1, 24]}"#), Ok(1));
    assert_eq!(
        radio.load_rx_codes("{"),
        Err(Error::Registry(RegistryError::Malformed))
    );
    assert_eq!(
        radio.load_tx_codes("[]", &mut publisher),
        Err(Error::Registry(RegistryError::ExpectedObject))
    );
    assert!(publisher.published.is_empty());
    assert_eq!(radio.rx().codes().len(), 1);
}
