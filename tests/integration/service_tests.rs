//! Integration tests for the AppService → FSM → relay pipeline.
//!
//! These run on the host and drive full control cycles through mock
//! adapters: conditioning, fail-safe, hysteresis, manual override and the
//! advisory fuzzy decision.

use crate::mock_hw::{MockClock, MockHardware, MemoryStore, RecordingSink};

use irrigator::app::commands::{AppCommand, CommandOutcome};
use irrigator::app::events::{AppEvent, PumpChangeCause};
use irrigator::app::service::AppService;
use irrigator::config::SystemConfig;
use irrigator::error::SensorError;
use irrigator::fsm::StateId;
use irrigator::sensors::climate::ClimateSample;
use irrigator::sensors::Channel;

struct Rig {
    app: AppService,
    hw: MockHardware,
    store: MemoryStore,
    clock: MockClock,
    sink: RecordingSink,
}

impl Rig {
    fn new() -> Self {
        let mut app = AppService::new(SystemConfig::default()).unwrap();
        let store = MemoryStore::new();
        let mut sink = RecordingSink::new();
        app.start(&store, &mut sink);
        Self {
            app,
            hw: MockHardware::new(),
            store,
            clock: MockClock::at(0),
            sink,
        }
    }

    /// Advance the clock by `ms` and run one cycle.
    fn tick_after(&mut self, ms: u64) {
        self.clock.advance(ms);
        self.app.tick(&mut self.hw, &self.clock, &mut self.sink);
    }

    fn command(&mut self, cmd: AppCommand) -> CommandOutcome {
        self.app
            .handle_command(cmd, &mut self.hw, &mut self.store, &self.clock, &mut self.sink)
    }

    fn pump_changes(&self, cause: PumpChangeCause) -> usize {
        self.sink.count(
            |e| matches!(e, AppEvent::PumpChanged { cause: c, .. } if *c == cause),
        )
    }
}

fn pump(on: bool, duration_ms: Option<u32>) -> AppCommand {
    AppCommand::Pump { on, duration_ms }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn starts_off_and_emits_started() {
    let rig = Rig::new();
    assert_eq!(rig.app.state(), StateId::Off);
    assert!(matches!(
        rig.sink.events.first(),
        Some(AppEvent::Started(StateId::Off))
    ));
}

// ── Hysteresis ────────────────────────────────────────────────

#[test]
fn dry_soil_starts_pump_and_wet_soil_stops_it() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(60);
    rig.tick_after(1000);
    assert!(rig.app.pump_on());
    assert!(rig.hw.pump_on(), "relay must follow the state");

    rig.hw.set_soil_pct(70);
    rig.tick_after(1000);
    assert!(!rig.app.pump_on());
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.pump_changes(PumpChangeCause::Hysteresis), 2);
}

#[test]
fn dead_band_holds_pump_on() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(60);
    rig.tick_after(1000);
    assert!(rig.app.pump_on());

    for pct in [66, 67, 68, 69, 68, 67, 66, 69] {
        rig.hw.set_soil_pct(pct);
        rig.tick_after(1000);
        assert!(rig.app.pump_on(), "pump dropped inside dead band at {pct}%");
    }
}

#[test]
fn dead_band_holds_pump_off() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(75);
    rig.tick_after(1000);
    assert!(!rig.app.pump_on());

    for pct in [69, 68, 67, 66] {
        rig.hw.set_soil_pct(pct);
        rig.tick_after(1000);
        assert!(!rig.app.pump_on(), "pump started inside dead band at {pct}%");
    }

    rig.hw.set_soil_pct(65);
    rig.tick_after(1000);
    assert!(rig.app.pump_on(), "threshold itself starts the pump");
}

// ── Fail-safe ─────────────────────────────────────────────────

#[test]
fn low_reservoir_keeps_pump_off_from_first_cycle() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(10);
    rig.hw.set_reservoir_pct(10);
    rig.tick_after(1000);

    assert!(!rig.app.pump_on());
    assert!(!rig.hw.pump_on());
    assert_ne!(rig.app.fault_flags(), 0);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::FailSafeTripped { reservoir_pct: 10 })),
        1
    );
}

#[test]
fn draining_reservoir_stops_running_pump() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(30);
    rig.hw.set_reservoir_pct(80);
    rig.tick_after(1000);
    assert!(rig.app.pump_on());

    // The reservoir channel is smoothed, so the level falls over a few
    // cycles rather than at once.
    rig.hw.set_reservoir_pct(0);
    let mut cycles = 0;
    while rig.app.pump_on() && cycles < 20 {
        rig.tick_after(1000);
        cycles += 1;
    }

    assert!(!rig.app.pump_on(), "fail-safe never engaged");
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.pump_changes(PumpChangeCause::FailSafe), 1);
    let snap = rig.app.snapshot().unwrap();
    assert!(snap.reservoir.percent < 15);
}

#[test]
fn fail_safe_refuses_and_cancels_manual_runs() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(90);
    rig.tick_after(1000);
    assert_eq!(rig.command(pump(true, Some(10_000))), CommandOutcome::PumpOn);
    assert!(rig.app.override_expiry_ms().is_some());

    // The tank runs dry mid-run: the override is dropped with the pump.
    rig.hw.set_reservoir_pct(0);
    for _ in 0..20 {
        if rig.app.fault_flags() != 0 {
            break;
        }
        rig.tick_after(100);
    }
    assert_ne!(rig.app.fault_flags(), 0);
    assert!(!rig.app.pump_on());
    assert_eq!(rig.app.override_expiry_ms(), None);

    assert_eq!(
        rig.command(pump(true, None)),
        CommandOutcome::Refused("reservoir below minimum")
    );
    assert!(!rig.app.pump_on());
}

#[test]
fn fail_safe_clears_when_reservoir_recovers() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(40);
    rig.hw.set_reservoir_pct(5);
    rig.tick_after(1000);
    assert!(!rig.app.pump_on());

    rig.hw.set_reservoir_pct(100);
    for _ in 0..20 {
        rig.tick_after(1000);
        if rig.app.fault_flags() == 0 {
            break;
        }
    }
    assert_eq!(rig.app.fault_flags(), 0);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, AppEvent::FailSafeCleared { .. })),
        1
    );
    // Hysteresis resumes in the cycle that cleared the fault.
    assert!(rig.app.pump_on());
}

// ── Manual override ───────────────────────────────────────────

#[test]
fn timed_override_runs_then_expires_on_its_own() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(90);
    rig.tick_after(1000);
    assert!(!rig.app.pump_on());

    assert_eq!(rig.command(pump(true, Some(5000))), CommandOutcome::PumpOn);
    assert!(rig.app.pump_on());
    assert!(rig.hw.pump_on(), "manual start must reach the relay at once");
    assert_eq!(rig.app.override_expiry_ms(), Some(6000));

    // Wet soil would normally stop the pump; the override suspends that.
    rig.tick_after(1000);
    rig.tick_after(3999);
    assert!(rig.app.pump_on());
    let snap = rig.app.snapshot().unwrap();
    assert_eq!(snap.override_remaining_ms, Some(1));

    rig.tick_after(1);
    assert!(!rig.app.pump_on());
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.app.override_expiry_ms(), None);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::OverrideExpired)),
        1
    );
    assert_eq!(rig.pump_changes(PumpChangeCause::OverrideExpired), 1);

    // Expiry fires once only.
    rig.tick_after(1000);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::OverrideExpired)),
        1
    );
    assert!(!rig.app.pump_on());
}

#[test]
fn idle_poll_expires_override_between_cycles() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(90);
    rig.tick_after(1000);
    rig.command(pump(true, Some(5000)));

    rig.clock.advance(4999);
    assert!(!rig.app.poll_override(&mut rig.hw, &rig.clock, &mut rig.sink));
    assert!(rig.hw.pump_on());

    rig.clock.advance(1);
    assert!(rig.app.poll_override(&mut rig.hw, &rig.clock, &mut rig.sink));
    assert!(!rig.app.pump_on());
    assert!(!rig.hw.pump_on());
}

#[test]
fn manual_off_cancels_override() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(90);
    rig.tick_after(1000);
    rig.command(pump(true, Some(8000)));

    assert_eq!(rig.command(pump(false, None)), CommandOutcome::PumpOff);
    assert!(!rig.app.pump_on());
    assert!(!rig.hw.pump_on());
    assert_eq!(rig.app.override_expiry_ms(), None);
    assert_eq!(rig.pump_changes(PumpChangeCause::Manual), 2);
}

#[test]
fn override_duration_defaults_and_clamps_to_max() {
    let mut rig = Rig::new();
    rig.clock.set(1000);

    rig.command(pump(true, None));
    assert_eq!(rig.app.override_expiry_ms(), Some(21_000));

    rig.command(pump(true, Some(120_000)));
    assert_eq!(rig.app.override_expiry_ms(), Some(21_000));
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::OverrideStarted {
            duration_ms: Some(20_000)
        }
    )));
}

#[test]
fn zero_duration_runs_until_hysteresis_stops_it() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(68);
    rig.tick_after(1000);
    assert!(!rig.app.pump_on());

    rig.command(pump(true, Some(0)));
    assert!(rig.app.pump_on());
    assert_eq!(rig.app.override_expiry_ms(), None);

    // Inside the dead band the manual run keeps going...
    rig.tick_after(60_000);
    assert!(rig.app.pump_on());

    // ...until the soil is wet enough.
    rig.hw.set_soil_pct(70);
    rig.tick_after(1000);
    assert!(!rig.app.pump_on());
}

// ── Decision and snapshot ─────────────────────────────────────

#[test]
fn hot_dry_sunny_suggests_longest_run() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(10);
    rig.hw.set_light_pct(85);
    rig.hw.climate = Ok(ClimateSample {
        temperature_c: 35.0,
        humidity_pct: 30.0,
    });
    rig.tick_after(1000);

    let snap = rig.app.snapshot().unwrap();
    assert_eq!(snap.rule_id, 1);
    assert_eq!(snap.suggested_ms, 18_000);
    assert_eq!(rig.app.decision().duration_ms, 18_000);
    assert!(snap.climate.valid);
    assert_eq!(snap.soil.percent, 10);
    assert_eq!(snap.light.percent, 85);
}

#[test]
fn moist_soil_suggests_nothing() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(90);
    rig.tick_after(1000);
    let snap = rig.app.snapshot().unwrap();
    assert_eq!(snap.suggested_ms, 0);
    assert!(!snap.pump_on);
}

#[test]
fn suggestion_does_not_time_the_pump() {
    let mut rig = Rig::new();
    // Somewhat dry and comfortable: rule 4 suggests an 8 s run.
    rig.hw.set_soil_pct(50);
    rig.tick_after(1000);
    let snap = rig.app.snapshot().unwrap();
    assert_eq!(snap.rule_id, 4);
    assert_eq!(snap.rule_label, Some("somewhat dry, warm"));
    assert_eq!(snap.suggested_ms, 8_000);
    assert!(snap.pump_on);
    assert_eq!(snap.override_remaining_ms, None);
    assert_eq!(snap.state_age_ms, 0, "pump switched on this cycle");

    // Well past the suggestion the pump is still governed by hysteresis.
    rig.tick_after(30_000);
    assert!(rig.app.pump_on());
    assert_eq!(rig.app.snapshot().unwrap().state_age_ms, 30_000);
}

#[test]
fn failed_climate_read_falls_back_and_is_rate_limited() {
    let mut rig = Rig::new();
    rig.hw.climate = Err(SensorError::Timeout);
    rig.tick_after(1000);
    let snap = rig.app.snapshot().unwrap();
    assert!(!snap.climate.valid);
    assert_eq!(rig.hw.climate_reads, 1);

    // Within the refresh window the sensor is not touched again.
    rig.tick_after(1000);
    assert_eq!(rig.hw.climate_reads, 1);
    rig.tick_after(1000);
    assert_eq!(rig.hw.climate_reads, 2);

    // A good read later keeps being served once the sensor fails again.
    rig.hw.climate = Ok(ClimateSample {
        temperature_c: 21.5,
        humidity_pct: 60.0,
    });
    rig.tick_after(2000);
    rig.hw.climate = Err(SensorError::ChecksumMismatch);
    rig.tick_after(2000);
    let snap = rig.app.snapshot().unwrap();
    assert!(snap.climate.valid);
    assert!((snap.climate.temperature_c - 21.5).abs() < f32::EPSILON);
}

#[test]
fn dead_climate_sensor_eventually_reads_invalid() {
    let mut rig = Rig::new();
    rig.tick_after(1000);
    assert!(rig.app.snapshot().unwrap().climate.valid);

    rig.hw.climate = Err(SensorError::Timeout);
    rig.tick_after(60_000);
    assert!(rig.app.snapshot().unwrap().climate.valid, "within max age");
    rig.tick_after(2000);
    let snap = rig.app.snapshot().unwrap();
    assert!(!snap.climate.valid);
    assert_eq!(snap.climate.last_update_ms, Some(1000));
}

// ── ADC failures ──────────────────────────────────────────────

#[test]
fn unread_reservoir_counts_as_empty() {
    let mut rig = Rig::new();
    rig.hw.failing_adc = Some(Channel::Reservoir);
    rig.hw.set_soil_pct(40);
    rig.tick_after(1000);

    let snap = rig.app.snapshot().unwrap();
    assert!(!snap.reservoir.fresh);
    assert_eq!(snap.reservoir.percent, 0);
    assert!(!rig.app.pump_on());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::FailSafeTripped { .. })),
        1
    );
}

#[test]
fn failed_soil_read_keeps_last_good_value() {
    let mut rig = Rig::new();
    rig.hw.set_soil_pct(60);
    rig.tick_after(1000);
    assert!(rig.app.pump_on());

    // A dead ADC must not read as bone-dry or soaked.
    rig.hw.failing_adc = Some(Channel::Soil);
    rig.hw.soil = 0;
    rig.tick_after(1000);
    let snap = rig.app.snapshot().unwrap();
    assert!(!snap.soil.fresh);
    assert_eq!(snap.soil.percent, 60);
    assert!(rig.app.pump_on());
    assert_eq!(rig.pump_changes(PumpChangeCause::Hysteresis), 1);
}

#[test]
fn relay_failure_does_not_stop_the_cycle() {
    let mut rig = Rig::new();
    rig.hw.fail_relay = true;
    rig.hw.set_soil_pct(40);
    rig.tick_after(1000);
    assert!(rig.app.pump_on(), "state still follows the readings");
    assert!(rig.hw.relay_writes.is_empty());
    assert_eq!(rig.app.tick_count(), 1);
}
