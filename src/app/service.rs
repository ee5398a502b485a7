//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the signal conditioner, the fuzzy decision state,
//! the pump FSM, the safety supervisor and the live calibration.  It
//! exposes a clean, hardware-agnostic API.  All I/O flows through port
//! traits injected at call sites, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!  ClimatePort ──▶ │          AppService           │
//!    ClockPort ──▶ │ Conditioner · Fuzzy · Safety  │
//! ActuatorPort ◀── │        FSM · Calibration      │ ◀─▶ CalibrationPort
//!                  └──────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::calibration::{CalibrationRefs, CalibrationSet};
use crate::config::SystemConfig;
use crate::fsm::context::{ControlSnapshot, FsmContext};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::fuzzy::{self, DecisionResult, FuzzyInputs};
use crate::safety::{FaultChange, SafetySupervisor};
use crate::sensors::{Channel, SignalConditioner};

use super::commands::{AppCommand, CommandOutcome};
use super::events::{AppEvent, PumpChangeCause, ReadingSnapshot};
use super::inbox::CommandInbox;
use super::ports::{
    ActuatorPort, CalibrationPort, ClimatePort, ClockPort, ConfigError, EventSink, SensorPort,
    StorageError,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetySupervisor,
    conditioner: SignalConditioner,
    calibration: CalibrationSet,
    decision: DecisionResult,
    last_snapshot: Option<ReadingSnapshot>,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from a validated configuration.
    ///
    /// Does **not** start the FSM: call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let safety = SafetySupervisor::new(&config);
        let ctx = FsmContext::new(&config);
        let conditioner = SignalConditioner::new(&config);
        let fsm = Fsm::new(build_state_table(), StateId::Off);

        Ok(Self {
            calibration: config.calibration,
            config,
            fsm,
            ctx,
            safety,
            conditioner,
            decision: DecisionResult::default(),
            last_snapshot: None,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load stored calibration (if any) and start the FSM in `Off`.
    ///
    /// A store with no data, or one that fails, leaves the compiled-in
    /// references in place.
    pub fn start(&mut self, store: &impl CalibrationPort, sink: &mut impl EventSink) {
        match store.load() {
            Ok(Some(set)) => {
                info!("Calibration loaded from store: {set:?}");
                self.calibration = set;
                sink.emit(&AppEvent::CalibrationChanged(set));
            }
            Ok(None) => info!("No stored calibration, using defaults"),
            Err(e) => {
                warn!("Calibration load failed ({e}), using defaults");
                sink.emit(&AppEvent::CalibrationStoreFailed(e));
            }
        }

        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full control cycle:
    /// condition → safety → FSM → override watchdog → fuzzy → actuator.
    ///
    /// The `hw` parameter satisfies the sensor, climate **and** actuator
    /// ports: this avoids a double mutable borrow while keeping the port
    /// boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ClimatePort + ActuatorPort),
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> ReadingSnapshot {
        self.tick_count += 1;
        let now = clock.now_ms();
        self.ctx.now_ms = now;

        // 1. Acquire and condition every channel
        let readings = self.conditioner.condition(hw, now, &self.calibration);
        self.ctx.sensors = ControlSnapshot {
            soil_pct: readings.soil.percent,
            reservoir_pct: readings.reservoir.percent,
        };

        // 2. Safety evaluation
        match self.safety.evaluate(&self.ctx.sensors) {
            Some(FaultChange::Tripped(fault)) => {
                warn!("Fail-safe tripped: {fault} ({}%)", readings.reservoir.percent);
                sink.emit(&AppEvent::FailSafeTripped {
                    reservoir_pct: readings.reservoir.percent,
                });
            }
            Some(FaultChange::Cleared(_)) => {
                sink.emit(&AppEvent::FailSafeCleared {
                    reservoir_pct: readings.reservoir.percent,
                });
            }
            None => {}
        }
        self.ctx.fault_flags = self.safety.faults();

        // 3. FSM tick (hysteresis + fail-safe)
        if let Some(from) = self.fsm.tick(&mut self.ctx) {
            let cause = if self.ctx.has_faults() {
                PumpChangeCause::FailSafe
            } else {
                PumpChangeCause::Hysteresis
            };
            self.emit_pump_change(from, cause, sink);
        }

        // 4. Override watchdog
        self.run_watchdog(sink);

        // 5. Advisory decision
        let inputs = FuzzyInputs::from_readings(
            readings.soil.percent,
            readings.light.percent,
            &readings.climate,
            self.config.fallback_temperature_c,
        );
        self.decision = fuzzy::decide(&inputs, &self.config.membership, self.config.max_pump_ms);
        debug!(
            "cycle {}: {inputs:?} → rule {} ({}) suggests {} ms",
            self.tick_count,
            self.decision.dominant_rule,
            self.decision.dominant_label().unwrap_or("none"),
            self.decision.duration_ms
        );

        // 6. Apply the pump command via ActuatorPort
        self.apply_actuators(hw);

        let mut snapshot = ReadingSnapshot::from_readings(&readings);
        snapshot.pump_on = self.ctx.commands.pump_on;
        snapshot.suggested_ms = self.decision.duration_ms;
        snapshot.rule_id = self.decision.dominant_rule;
        snapshot.rule_label = self.decision.dominant_label();
        snapshot.override_remaining_ms = self.ctx.override_remaining_ms();
        snapshot.fault_flags = self.ctx.fault_flags;
        snapshot.state_age_ms = self.ctx.time_in_state_ms();
        self.last_snapshot = Some(snapshot);
        snapshot
    }

    /// Check the override expiry without a full cycle.  Call from the idle
    /// loop between cycles.  Returns `true` if the pump was switched off.
    pub fn poll_override(
        &mut self,
        hw: &mut impl ActuatorPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> bool {
        self.ctx.now_ms = clock.now_ms();
        let fired = self.run_watchdog(sink);
        if fired {
            self.apply_actuators(hw);
        }
        fired
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (status page, console, etc.).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut (impl SensorPort + ActuatorPort),
        store: &mut impl CalibrationPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        self.ctx.now_ms = clock.now_ms();
        match cmd {
            AppCommand::Pump { on: true, duration_ms } => {
                if self.safety.has_faults() {
                    warn!("Manual start refused: reservoir below minimum");
                    return CommandOutcome::Refused("reservoir below minimum");
                }
                let max = self.config.max_pump_ms;
                let duration = duration_ms.unwrap_or(max).min(max);
                let now = self.ctx.now_ms;
                self.ctx.override_expiry_ms = (duration > 0).then(|| now + u64::from(duration));
                sink.emit(&AppEvent::OverrideStarted {
                    duration_ms: (duration > 0).then_some(duration),
                });
                if let Some(from) = self.fsm.force_transition(StateId::On, &mut self.ctx) {
                    self.emit_pump_change(from, PumpChangeCause::Manual, sink);
                }
                self.apply_actuators(hw);
                CommandOutcome::PumpOn
            }
            AppCommand::Pump { on: false, .. } => {
                self.ctx.override_expiry_ms = None;
                if let Some(from) = self.fsm.force_transition(StateId::Off, &mut self.ctx) {
                    self.emit_pump_change(from, PumpChangeCause::Manual, sink);
                }
                self.apply_actuators(hw);
                CommandOutcome::PumpOff
            }
            AppCommand::CaptureReference { channel, point } => {
                let raw = match self.conditioner.acquire(hw, channel) {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!("Calibration: {} capture failed ({e})", channel.name());
                        return CommandOutcome::SensorFailed(e);
                    }
                };
                let mut candidate = self.calibration;
                candidate.set_point(channel, point, i32::from(raw));
                info!("Calibration: {} {point:?} captured at {raw}", channel.name());
                self.set_calibration(channel, candidate.get(channel), sink)
            }
            AppCommand::SetCalibration { channel, refs } => {
                self.set_calibration(channel, refs, sink)
            }
            AppCommand::SaveCalibration => match store.save(&self.calibration) {
                Ok(()) => {
                    info!("Calibration saved");
                    CommandOutcome::Saved
                }
                Err(e) => self.store_failed("save", e, sink),
            },
            AppCommand::LoadCalibration => match store.load() {
                Ok(Some(set)) => {
                    self.calibration = set;
                    info!("Calibration loaded: {set:?}");
                    sink.emit(&AppEvent::CalibrationChanged(set));
                    CommandOutcome::Loaded
                }
                Ok(None) => CommandOutcome::NoData,
                Err(e) => self.store_failed("load", e, sink),
            },
            AppCommand::ResetCalibration => match store.reset() {
                Ok(()) => {
                    self.calibration = self.config.calibration;
                    info!("Calibration reset to defaults");
                    sink.emit(&AppEvent::CalibrationChanged(self.calibration));
                    CommandOutcome::Reset
                }
                Err(e) => self.store_failed("reset", e, sink),
            },
            AppCommand::ShowCalibration => {
                sink.emit(&AppEvent::CalibrationReport(self.calibration));
                CommandOutcome::Reported
            }
        }
    }

    /// Apply every queued command, oldest first.  Returns how many ran.
    pub fn drain_inbox(
        &mut self,
        inbox: &CommandInbox,
        hw: &mut (impl SensorPort + ActuatorPort),
        store: &mut impl CalibrationPort,
        clock: &impl ClockPort,
        sink: &mut impl EventSink,
    ) -> usize {
        let cmds = inbox.drain();
        for cmd in &cmds {
            let outcome = self.handle_command(*cmd, hw, store, clock, sink);
            debug!("{cmd:?} → {outcome:?}");
        }
        cmds.len()
    }

    // ── Calibration entry points ──────────────────────────────

    pub fn calibration(&self) -> &CalibrationSet {
        &self.calibration
    }

    /// Replace a channel's references in memory.  Not persisted until a
    /// [`AppCommand::SaveCalibration`].
    ///
    /// A zero span would map every reading to 0 %, which reads as an empty
    /// reservoir or bone-dry soil, so it is refused and nothing changes.
    pub fn set_calibration(
        &mut self,
        channel: Channel,
        refs: CalibrationRefs,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        if refs.is_degenerate() {
            warn!(
                "Calibration: {} refused, both references are {}",
                channel.name(),
                refs.low
            );
            return CommandOutcome::Refused("calibration span is zero");
        }
        self.calibration.set(channel, refs);
        info!(
            "Calibration: {} set to {}..{}",
            channel.name(),
            refs.low,
            refs.high
        );
        sink.emit(&AppEvent::CalibrationChanged(self.calibration));
        CommandOutcome::CalibrationUpdated
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn pump_on(&self) -> bool {
        self.ctx.commands.pump_on
    }

    /// Latest advisory decision.
    pub fn decision(&self) -> &DecisionResult {
        &self.decision
    }

    /// Snapshot produced by the most recent cycle.
    pub fn snapshot(&self) -> Option<ReadingSnapshot> {
        self.last_snapshot
    }

    /// Total control cycles executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn override_expiry_ms(&self) -> Option<u64> {
        self.ctx.override_expiry_ms
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Force `Off` once the override expiry has passed.  Clears the expiry
    /// exactly once.
    fn run_watchdog(&mut self, sink: &mut impl EventSink) -> bool {
        if !self.ctx.override_expired() {
            return false;
        }
        self.ctx.override_expiry_ms = None;
        info!("Manual run expired");
        sink.emit(&AppEvent::OverrideExpired);
        if let Some(from) = self.fsm.force_transition(StateId::Off, &mut self.ctx) {
            self.emit_pump_change(from, PumpChangeCause::OverrideExpired, sink);
        }
        true
    }

    fn emit_pump_change(&self, from: StateId, cause: PumpChangeCause, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::PumpChanged {
            from,
            to: self.fsm.current_state(),
            cause,
        });
    }

    /// Translate the FSM pump command into a port call.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        let on = self.ctx.commands.pump_on && !self.safety.has_faults();
        if let Err(e) = hw.set_pump(on) {
            warn!("Pump relay write failed: {e}");
        }
    }

    fn store_failed(
        &self,
        op: &str,
        e: StorageError,
        sink: &mut impl EventSink,
    ) -> CommandOutcome {
        warn!("Calibration {op} failed: {e}");
        sink.emit(&AppEvent::CalibrationStoreFailed(e));
        CommandOutcome::StoreFailed(e)
    }
}
