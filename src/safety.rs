//! Safety supervisor.
//!
//! The supervisor runs **every cycle before the FSM** and accumulates a
//! fault bitmask in `FsmContext.fault_flags`.  The `On` state handler
//! checks this mask first and releases the pump while any bit is set; the
//! `Off` handler refuses to start.
//!
//! ## Fault lifecycle
//!
//! 1. A condition triggers a fault (reservoir below the minimum level).
//! 2. The supervisor sets the corresponding bit in `fault_flags`.
//! 3. The FSM drops to `Off` and clears any manual override.  Manual
//!    starts are refused while the bit is set.
//! 4. Each cycle the supervisor re-evaluates against the fresh reading.
//!    Once the condition clears, it unsets the bit and normal hysteresis
//!    resumes.

use crate::config::SystemConfig;
use crate::error::SafetyFault;
use crate::fsm::context::ControlSnapshot;
use log::{info, warn};

/// Outcome of one evaluation, for event reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultChange {
    Tripped(SafetyFault),
    Cleared(SafetyFault),
}

/// Safety supervisor.
pub struct SafetySupervisor {
    reservoir_min_pct: u8,
    /// Latched fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            reservoir_min_pct: config.reservoir_min_pct,
            faults: 0,
        }
    }

    /// Evaluate all safety conditions against the latest readings.
    /// Returns the fault that changed state this cycle, if any.
    pub fn evaluate(&mut self, snap: &ControlSnapshot) -> Option<FaultChange> {
        // ── Reservoir level ──────────────────────────────────────
        self.eval_fault(
            SafetyFault::ReservoirLow,
            snap.reservoir_pct < self.reservoir_min_pct,
        )
    }

    /// Current fault bitmask.
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// True if **any** fault is active.
    pub fn has_faults(&self) -> bool {
        self.faults != 0
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) -> Option<FaultChange> {
        let was_set = self.faults & fault.mask() != 0;
        if condition {
            self.faults |= fault.mask();
            if !was_set {
                warn!("SAFETY FAULT SET: {fault}");
                return Some(FaultChange::Tripped(fault));
            }
        } else {
            self.faults &= !fault.mask();
            if was_set {
                info!("SAFETY FAULT CLEARED: {fault}");
                return Some(FaultChange::Cleared(fault));
            }
        }
        None
    }
}
