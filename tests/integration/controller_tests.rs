//! Integration tests for the light sensor → controller → servo loop.
//!
//! Drive [`HotWaterController`] against [`MockBoiler`] with a 10 ms poll and
//! check the externally visible behaviour: servo call history, emitted
//! events, and the safety policy.

use boilerbridge::app::events::ControllerEvent::{Fault, StateChanged};
use boilerbridge::config::SystemConfig;
use boilerbridge::error::SafetyFault;
use boilerbridge::fsm::StateId;
use boilerbridge::fsm::controller::HotWaterController;

use super::mock_hw::{MockBoiler, RecordingSink, STEP_MS, ServoCall, run_for};

fn setup(config: &SystemConfig, hot_water: bool) -> (HotWaterController, MockBoiler, RecordingSink) {
    let mut c = HotWaterController::new(config);
    let mut hw = MockBoiler::new(hot_water);
    let mut sink = RecordingSink::default();
    run_for(&mut c, &mut hw, &mut sink, 100);
    (c, hw, sink)
}

// ── Happy path ────────────────────────────────────────────────

#[test]
fn request_on_presses_once_and_verifies() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), false);
    assert_eq!(sink.events, vec![StateChanged(false)]);

    c.request_state(true);
    c.poll(hw.now, &mut hw, &mut sink);
    assert_eq!(c.state(), StateId::PressingOn);
    assert_eq!(hw.calls, vec![ServoCall::Attach, ServoCall::Write(70), ServoCall::Delay(500)]);

    run_for(&mut c, &mut hw, &mut sink, 3_000);
    assert_eq!(c.state(), StateId::Waiting);
    assert_eq!(sink.events, vec![StateChanged(false), StateChanged(true)]);
    assert_eq!(
        hw.calls,
        vec![
            ServoCall::Attach,
            ServoCall::Write(70),
            ServoCall::Delay(500),
            ServoCall::Write(0),
            ServoCall::Delay(500),
            ServoCall::Detach,
            ServoCall::Delay(100),
        ]
    );
    assert!(!hw.is_attached());
    assert_eq!(hw.presses, 1);
    assert_eq!(c.changes_remaining(), 9);
}

#[test]
fn request_off_uses_pressing_off() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), true);
    c.request_state(false);
    c.poll(hw.now, &mut hw, &mut sink);
    assert_eq!(c.state(), StateId::PressingOff);
    run_for(&mut c, &mut hw, &mut sink, 3_000);
    assert_eq!(c.state(), StateId::Waiting);
    assert!(!hw.hot_water);
}

#[test]
fn rate_limit_is_measured_from_attempt_start() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), false);
    let t0 = hw.now;
    c.request_state(true);

    while hw.now.wrapping_sub(t0) < 30_000 {
        c.poll(hw.now, &mut hw, &mut sink);
        assert_ne!(c.state(), StateId::Idle, "left waiting early at +{}", hw.now - t0);
        hw.now += STEP_MS;
    }
    c.poll(hw.now, &mut hw, &mut sink);
    assert_eq!(c.state(), StateId::Idle);
}

#[test]
fn request_during_waiting_is_deferred_not_lost() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), false);
    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 5_000);
    assert_eq!(c.state(), StateId::Waiting);

    c.request_state(false);
    run_for(&mut c, &mut hw, &mut sink, 5_000);
    assert_eq!(c.state(), StateId::Waiting);
    assert_eq!(c.pending_request(), Some(false));
    assert_eq!(hw.presses, 1);

    run_for(&mut c, &mut hw, &mut sink, 30_000);
    assert!(!hw.hot_water);
    assert_eq!(hw.presses, 2);
    assert_eq!(c.pending_request(), None);
}

// ── Retries and press failure ─────────────────────────────────

#[test]
fn ignored_press_is_retried() {
    let config = SystemConfig::default();
    let (mut c, mut hw, mut sink) = setup(&config, false);
    hw.ignore_presses = 1;

    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 10_000);

    assert_eq!(c.state(), StateId::Waiting);
    assert!(hw.hot_water);
    assert_eq!(hw.presses, 2);
    assert_eq!(c.retries_remaining(), config.n_retries - 1);
    assert_eq!(sink.faults(), 0);
    assert_eq!(c.changes_remaining(), config.n_changes - 1, "retries are not charged");
}

#[test]
fn retry_press_is_held_as_long_as_the_first() {
    let config = SystemConfig::default();
    let (mut c, mut hw, mut sink) = setup(&config, false);
    hw.ignore_presses = 1;

    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 10_000);

    let hold = config.servo_settle_ms + config.servo_press_duration_ms;
    assert_eq!(hw.presses, 2);
    assert_eq!(hw.hold_times(), vec![hold, hold]);
}

#[test]
fn unresponsive_boiler_faults_once() {
    let config = SystemConfig::default();
    let (mut c, mut hw, mut sink) = setup(&config, false);
    hw.responsive = false;

    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 60_000);

    assert_eq!(c.state(), StateId::FaultPressFailed);
    assert_eq!(c.fault(), Some(SafetyFault::PressFailed));
    assert_eq!(hw.presses, 1 + config.n_retries);
    assert_eq!(sink.faults(), 1);
    assert_eq!(sink.events.last(), Some(&Fault(SafetyFault::PressFailed)));
    assert!(!hw.is_attached());

    // Terminal: nothing ever moves the servo again.
    let calls = hw.calls.len();
    c.request_state(false);
    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 120_000);
    assert_eq!(hw.calls.len(), calls);
    assert_eq!(sink.faults(), 1);
    assert_eq!(c.state(), StateId::FaultPressFailed);
}

#[test]
fn state_changes_still_reported_after_fault() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), false);
    hw.responsive = false;
    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 60_000);
    assert!(c.state().is_terminal());

    hw.hot_water = true;
    run_for(&mut c, &mut hw, &mut sink, 500);
    assert_eq!(sink.state_changes(), vec![false, true]);
}

// ── Change quota ──────────────────────────────────────────────

#[test]
fn attempt_that_empties_quota_faults_instead_of_pressing() {
    let config = SystemConfig {
        n_changes: 2,
        rate_limit_ms: 1_000,
        ..SystemConfig::default()
    };
    let (mut c, mut hw, mut sink) = setup(&config, false);

    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 5_000);
    assert_eq!(c.state(), StateId::Idle);
    assert!(hw.hot_water);
    assert_eq!(c.changes_remaining(), 1);

    c.request_state(false);
    c.poll(hw.now, &mut hw, &mut sink);
    assert_eq!(c.state(), StateId::FaultRateLimit);
    assert_eq!(c.fault(), Some(SafetyFault::RateLimitReached));
    assert_eq!(sink.events.last(), Some(&Fault(SafetyFault::RateLimitReached)));
    assert_eq!(sink.faults(), 1);
    assert_eq!(c.changes_remaining(), 0);
    assert_eq!(hw.presses, 1, "the refused attempt never touches the servo");
}

#[test]
fn rate_limit_fault_is_terminal() {
    let config = SystemConfig {
        n_changes: 2,
        rate_limit_ms: 1_000,
        change_window_ms: 10_000,
        ..SystemConfig::default()
    };
    let (mut c, mut hw, mut sink) = setup(&config, false);
    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 5_000);
    c.request_state(false);
    run_for(&mut c, &mut hw, &mut sink, 100);
    assert_eq!(c.state(), StateId::FaultRateLimit);

    // Neither new requests nor a refilled quota bring the servo back.
    let calls = hw.calls.len();
    for target in [true, false, true] {
        c.request_state(target);
        run_for(&mut c, &mut hw, &mut sink, 20_000);
    }
    assert_eq!(hw.calls.len(), calls);
    assert_eq!(hw.presses, 1);
    assert_eq!(sink.faults(), 1);
    assert_eq!(c.state(), StateId::FaultRateLimit);
    assert!(hw.hot_water);
}

#[test]
fn quota_refills_after_window() {
    let config = SystemConfig {
        n_changes: 2,
        change_window_ms: 20_000,
        rate_limit_ms: 1_000,
        ..SystemConfig::default()
    };
    let (mut c, mut hw, mut sink) = setup(&config, false);

    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 5_000);
    assert_eq!(c.changes_remaining(), 1);

    run_for(&mut c, &mut hw, &mut sink, 16_000);
    assert_eq!(c.changes_remaining(), 2);

    c.request_state(false);
    run_for(&mut c, &mut hw, &mut sink, 5_000);
    assert_eq!(c.state(), StateId::Idle);
    assert!(!hw.hot_water);
    assert_eq!(c.changes_remaining(), 1);
    assert_eq!(sink.faults(), 0);
}

#[test]
fn satisfied_requests_do_not_spend_quota() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), true);
    for _ in 0..50 {
        c.request_state(true);
        run_for(&mut c, &mut hw, &mut sink, 200);
    }
    assert!(hw.calls.is_empty());
    assert_eq!(c.changes_remaining(), 10);
    assert_eq!(c.state(), StateId::Idle);
}

// ── Requests and observation ──────────────────────────────────

#[test]
fn requests_between_polls_coalesce() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), false);
    c.request_state(true);
    c.request_state(false);
    c.poll(hw.now, &mut hw, &mut sink);

    assert_eq!(c.state(), StateId::Idle);
    assert_eq!(c.pending_request(), None);
    assert!(hw.calls.is_empty());
}

#[test]
fn manual_change_is_reported_without_actuation() {
    let (mut c, mut hw, mut sink) = setup(&SystemConfig::default(), false);
    hw.hot_water = true;
    run_for(&mut c, &mut hw, &mut sink, 500);
    hw.hot_water = false;
    run_for(&mut c, &mut hw, &mut sink, 500);

    assert_eq!(sink.state_changes(), vec![false, true, false]);
    assert!(hw.calls.is_empty());
    assert_eq!(c.state(), StateId::Idle);
}

#[test]
fn first_poll_reports_initial_state_once() {
    let (_c, _hw, sink) = setup(&SystemConfig::default(), true);
    assert_eq!(sink.events, vec![StateChanged(true)]);
}

// ── Clock wrap ────────────────────────────────────────────────

#[test]
fn full_cycle_across_clock_wrap() {
    let mut c = HotWaterController::new(&SystemConfig::default());
    let mut hw = MockBoiler::new(false).starting_at(u32::MAX - 1_000);
    let mut sink = RecordingSink::default();
    run_for(&mut c, &mut hw, &mut sink, 100);

    c.request_state(true);
    run_for(&mut c, &mut hw, &mut sink, 3_000);
    assert_eq!(c.state(), StateId::Waiting);
    assert!(hw.now < 10_000, "clock wrapped");

    run_for(&mut c, &mut hw, &mut sink, 30_000);
    assert_eq!(c.state(), StateId::Idle);
    assert_eq!(hw.presses, 1);
    assert_eq!(sink.state_changes(), vec![false, true]);
}
