//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the control readings for this cycle, the pump
//! command output, the thresholds, the clock, the override expiry and the
//! accumulated safety faults.  Think of it as the "blackboard" in a
//! blackboard architecture.

use crate::config::SystemConfig;
use crate::error::SafetyFault;

// ---------------------------------------------------------------------------
// Control snapshot (read-only to state handlers; written by the service)
// ---------------------------------------------------------------------------

/// The two calibrated percentages the pump logic acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlSnapshot {
    /// Soil moisture, 0–100 %.
    pub soil_pct: u8,
    /// Smoothed reservoir level, 0–100 %.
    pub reservoir_pct: u8,
}

// ---------------------------------------------------------------------------
// Pump command (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpCommand {
    /// Logical pump state.  Relay polarity is applied by the driver.
    pub pump_on: bool,
}

/// Hysteresis and fail-safe thresholds, copied out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpThresholds {
    pub soil_on_pct: u8,
    pub soil_off_pct: u8,
    pub reservoir_min_pct: u8,
}

impl From<&SystemConfig> for PumpThresholds {
    fn from(config: &SystemConfig) -> Self {
        Self {
            soil_on_pct: config.soil_on_pct,
            soil_off_pct: config.soil_off_pct,
            reservoir_min_pct: config.reservoir_min_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Clock reading for the current cycle (ms).
    pub now_ms: u64,
    /// Clock reading when the current state was entered (ms).
    pub state_entered_ms: u64,

    // -- Inputs --
    /// Latest calibrated readings.  Updated before each FSM tick.
    pub sensors: ControlSnapshot,
    pub thresholds: PumpThresholds,

    // -- Outputs --
    pub commands: PumpCommand,

    // -- Manual override --
    /// Absolute time at which a manual run ends.  `None` when no timed
    /// override is active.
    pub override_expiry_ms: Option<u64>,

    // -- Safety --
    /// Accumulated safety fault bitmask (see `SafetyFault::mask()`).
    /// Set by the safety supervisor, read by state handlers.
    pub fault_flags: u8,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            now_ms: 0,
            state_entered_ms: 0,
            sensors: ControlSnapshot::default(),
            thresholds: PumpThresholds::from(config),
            commands: PumpCommand::default(),
            override_expiry_ms: None,
            fault_flags: 0,
        }
    }

    /// Returns `true` if **any** safety fault is active.
    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    /// Check whether a specific fault flag is set.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }

    /// A timed override is running and has not yet expired.
    pub fn override_active(&self) -> bool {
        matches!(self.override_expiry_ms, Some(expiry) if self.now_ms < expiry)
    }

    /// The override expiry has been reached.
    pub fn override_expired(&self) -> bool {
        matches!(self.override_expiry_ms, Some(expiry) if self.now_ms >= expiry)
    }

    /// How long the pump has been in its current state.
    pub fn time_in_state_ms(&self) -> u64 {
        self.now_ms.saturating_sub(self.state_entered_ms)
    }

    /// Milliseconds left on the running override, if any.
    pub fn override_remaining_ms(&self) -> Option<u64> {
        self.override_expiry_ms
            .map(|expiry| expiry.saturating_sub(self.now_ms))
    }
}
