//! Integration tests for calibration commands and persistence.

use crate::mock_hw::{MemoryStore, MockClock, MockHardware, RecordingSink};

use irrigator::app::commands::{AppCommand, CommandOutcome};
use irrigator::app::events::AppEvent;
use irrigator::app::ports::StorageError;
use irrigator::app::service::AppService;
use irrigator::calibration::{CalibrationRefs, CalibrationSet, RefPoint};
use irrigator::config::SystemConfig;
use irrigator::error::SensorError;
use irrigator::sensors::Channel;

fn started(store: &MemoryStore) -> (AppService, RecordingSink) {
    let mut app = AppService::new(SystemConfig::default()).unwrap();
    let mut sink = RecordingSink::new();
    app.start(store, &mut sink);
    (app, sink)
}

#[test]
fn start_loads_stored_calibration() {
    let mut stored = CalibrationSet::default();
    stored.set(Channel::Light, CalibrationRefs::new(200, 900));
    let store = MemoryStore::holding(stored);

    let (app, sink) = started(&store);
    assert_eq!(*app.calibration(), stored);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CalibrationChanged(_))),
        1
    );
}

#[test]
fn start_with_failing_store_keeps_defaults() {
    let store = MemoryStore {
        fail_with: Some(StorageError::Corrupted),
        ..MemoryStore::default()
    };
    let (app, sink) = started(&store);
    assert_eq!(*app.calibration(), CalibrationSet::default());
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::CalibrationStoreFailed(StorageError::Corrupted)
        )),
        1
    );
}

#[test]
fn capture_uses_fresh_averaged_reading() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);

    hw.soil = 1333;
    let outcome = app.handle_command(
        AppCommand::CaptureReference {
            channel: Channel::Soil,
            point: RefPoint::High,
        },
        &mut hw,
        &mut store,
        &clock,
        &mut sink,
    );
    assert_eq!(outcome, CommandOutcome::CalibrationUpdated);
    assert_eq!(app.calibration().soil, CalibrationRefs::new(4095, 1333));

    hw.reservoir = 420;
    app.handle_command(
        AppCommand::CaptureReference {
            channel: Channel::Reservoir,
            point: RefPoint::Low,
        },
        &mut hw,
        &mut store,
        &clock,
        &mut sink,
    );
    assert_eq!(app.calibration().reservoir, CalibrationRefs::new(420, 2200));
    assert_eq!(store.saves, 0, "capture does not persist");
}

#[test]
fn new_references_apply_to_the_next_cycle() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(1000);

    hw.light = 600;
    app.handle_command(
        AppCommand::SetCalibration {
            channel: Channel::Light,
            refs: CalibrationRefs::new(500, 700),
        },
        &mut hw,
        &mut store,
        &clock,
        &mut sink,
    );
    let snap = app.tick(&mut hw, &clock, &mut sink);
    assert_eq!(snap.light.percent, 50);
    assert_eq!(snap.light.calibration, CalibrationRefs::new(500, 700));
}

#[test]
fn save_load_round_trip_through_store() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);

    let custom = CalibrationRefs::new(3800, 1500);
    assert_eq!(
        app.set_calibration(Channel::Soil, custom, &mut sink),
        CommandOutcome::CalibrationUpdated
    );
    assert_eq!(
        app.handle_command(AppCommand::SaveCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::Saved
    );
    assert_eq!(store.stored.map(|s| s.soil), Some(custom));

    // Change memory, then restore what was saved.
    app.set_calibration(Channel::Soil, CalibrationRefs::new(4000, 1000), &mut sink);
    assert_eq!(
        app.handle_command(AppCommand::LoadCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::Loaded
    );
    assert_eq!(app.calibration().soil, custom);
}

#[test]
fn load_with_nothing_stored_keeps_current_values() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);

    let custom = CalibrationRefs::new(350, 2100);
    app.set_calibration(Channel::Reservoir, custom, &mut sink);
    assert_eq!(
        app.handle_command(AppCommand::LoadCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::NoData
    );
    assert_eq!(app.calibration().reservoir, custom);
}

#[test]
fn reset_clears_store_and_restores_defaults() {
    let mut stored = CalibrationSet::default();
    stored.set(Channel::Soil, CalibrationRefs::new(3700, 1400));
    let mut store = MemoryStore::holding(stored);
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);
    assert_eq!(*app.calibration(), stored);

    assert_eq!(
        app.handle_command(AppCommand::ResetCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::Reset
    );
    assert_eq!(store.stored, None);
    assert_eq!(*app.calibration(), CalibrationSet::default());
}

#[test]
fn store_failures_are_reported_not_fatal() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);
    store.fail_with = Some(StorageError::Full);

    assert_eq!(
        app.handle_command(AppCommand::SaveCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::StoreFailed(StorageError::Full)
    );
    assert_eq!(
        app.handle_command(AppCommand::ResetCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::StoreFailed(StorageError::Full)
    );
    assert_eq!(*app.calibration(), CalibrationSet::default());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CalibrationStoreFailed(StorageError::Full))),
        2
    );

    // The control cycle carries on regardless.
    app.tick(&mut hw, &clock, &mut sink);
    assert_eq!(app.tick_count(), 1);
}

#[test]
fn failed_capture_leaves_calibration_untouched() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);
    hw.failing_adc = Some(Channel::Reservoir);
    sink.clear();

    let outcome = app.handle_command(
        AppCommand::CaptureReference {
            channel: Channel::Reservoir,
            point: RefPoint::Low,
        },
        &mut hw,
        &mut store,
        &clock,
        &mut sink,
    );
    assert_eq!(outcome, CommandOutcome::SensorFailed(SensorError::AdcReadFailed));
    assert_eq!(*app.calibration(), CalibrationSet::default());
    assert!(sink.events.is_empty());
}

#[test]
fn zero_span_references_are_refused() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);

    assert_eq!(
        app.handle_command(
            AppCommand::SetCalibration {
                channel: Channel::Light,
                refs: CalibrationRefs::new(600, 600),
            },
            &mut hw,
            &mut store,
            &clock,
            &mut sink,
        ),
        CommandOutcome::Refused("calibration span is zero")
    );

    // Capturing the high end at the low reference's value is just as empty.
    hw.reservoir = 300;
    assert_eq!(
        app.handle_command(
            AppCommand::CaptureReference {
                channel: Channel::Reservoir,
                point: RefPoint::High,
            },
            &mut hw,
            &mut store,
            &clock,
            &mut sink,
        ),
        CommandOutcome::Refused("calibration span is zero")
    );
    assert_eq!(*app.calibration(), CalibrationSet::default());
}

#[test]
fn show_reports_active_references() {
    let mut store = MemoryStore::new();
    let (mut app, mut sink) = started(&store);
    let mut hw = MockHardware::new();
    let clock = MockClock::at(0);
    let custom = CalibrationRefs::new(250, 2300);
    app.set_calibration(Channel::Reservoir, custom, &mut sink);
    sink.clear();

    assert_eq!(
        app.handle_command(AppCommand::ShowCalibration, &mut hw, &mut store, &clock, &mut sink),
        CommandOutcome::Reported
    );
    assert!(matches!(
        sink.events.as_slice(),
        [AppEvent::CalibrationReport(set)] if set.reservoir == custom
    ));
    assert_eq!(store.saves, 0);
}
