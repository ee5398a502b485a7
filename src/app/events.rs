//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, serve on a status
//! page, record in a test, etc.

use serde::Serialize;

use crate::app::ports::StorageError;
use crate::calibration::CalibrationSet;
use crate::fsm::StateId;
use crate::sensors::ConditionedReadings;
use crate::sensors::climate::ClimateReading;
use crate::sensors::ChannelReading;

/// Why the pump changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PumpChangeCause {
    /// Soil moisture crossed a threshold.
    Hysteresis,
    /// Reservoir below the minimum safe level.
    FailSafe,
    /// Manual command.
    Manual,
    /// A timed manual run reached its expiry.
    OverrideExpired,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The pump changed state.
    PumpChanged {
        from: StateId,
        to: StateId,
        cause: PumpChangeCause,
    },

    /// Reservoir dropped below the minimum; pump locked off.
    FailSafeTripped { reservoir_pct: u8 },

    /// Reservoir back at or above the minimum.
    FailSafeCleared { reservoir_pct: u8 },

    /// A manual run started.  `None` means no expiry.
    OverrideStarted { duration_ms: Option<u32> },

    /// A timed manual run ended on its own.
    OverrideExpired,

    /// Calibration references changed in memory.
    CalibrationChanged(CalibrationSet),

    /// The calibration store reported an error.
    CalibrationStoreFailed(StorageError),

    /// The active references, on request.
    CalibrationReport(CalibrationSet),

    /// Periodic reading snapshot.
    Telemetry(ReadingSnapshot),
}

/// Everything an external encoder needs to report one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingSnapshot {
    pub soil: ChannelReading,
    pub light: ChannelReading,
    /// Reservoir raw is the smoothed value.
    pub reservoir: ChannelReading,
    pub climate: ClimateReading,
    pub pump_on: bool,
    /// Advisory watering time from the fuzzy engine (ms).
    pub suggested_ms: u32,
    /// Dominant rule id, 0 when no rule fired.
    pub rule_id: u8,
    /// Plain-language description of the dominant rule.
    pub rule_label: Option<&'static str>,
    pub override_remaining_ms: Option<u64>,
    pub fault_flags: u8,
    /// How long the pump has been in its current state (ms).
    pub state_age_ms: u64,
}

impl ReadingSnapshot {
    pub fn from_readings(r: &ConditionedReadings) -> Self {
        Self {
            soil: r.soil,
            light: r.light,
            reservoir: r.reservoir,
            climate: r.climate,
            pump_on: false,
            suggested_ms: 0,
            rule_id: 0,
            rule_label: None,
            override_remaining_ms: None,
            fault_flags: 0,
            state_age_ms: 0,
        }
    }
}
