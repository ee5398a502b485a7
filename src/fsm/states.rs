//! Concrete state handler functions and table builder.
//!
//! Each state is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!        [soil <= on AND reservoir >= min]
//!   OFF ───────────────────────────────────▶ ON
//!    ▲                                        │
//!    └────────────────────────────────────────┘
//!     [fault] or [no timed run AND
//!      (soil >= off OR reservoir < min)]
//! ```
//!
//! The override watchdog and manual commands act through
//! [`Fsm::force_transition`](super::Fsm::force_transition); they are not
//! part of the table.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Off
        StateDescriptor {
            id: StateId::Off,
            name: "Off",
            on_enter: Some(off_enter),
            on_exit: None,
            on_update: off_update,
        },
        // Index 1: On
        StateDescriptor {
            id: StateId::On,
            name: "On",
            on_enter: Some(pumping_enter),
            on_exit: None,
            on_update: pumping_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF state
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!(
        "OFF: pump released (soil {}%, reservoir {}%)",
        ctx.sensors.soil_pct, ctx.sensors.reservoir_pct
    );
}

fn off_update(ctx: &mut FsmContext) -> Option<StateId> {
    if ctx.has_faults() {
        return None;
    }

    let t = ctx.thresholds;
    if ctx.sensors.soil_pct <= t.soil_on_pct && ctx.sensors.reservoir_pct >= t.reservoir_min_pct {
        info!(
            "OFF: soil {}% <= {}% with reservoir at {}% → watering",
            ctx.sensors.soil_pct, t.soil_on_pct, ctx.sensors.reservoir_pct
        );
        return Some(StateId::On);
    }

    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ON state
// ═══════════════════════════════════════════════════════════════════════════

fn pumping_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = true;
    match ctx.override_remaining_ms() {
        Some(ms) => info!("ON: pump energised for {ms} ms"),
        None => info!("ON: pump energised"),
    }
}

fn pumping_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Fail-safe beats everything, including a running override.
    if ctx.has_faults() {
        warn!(
            "ON: fault_flags=0b{:08b}, forcing pump off",
            ctx.fault_flags
        );
        ctx.override_expiry_ms = None;
        return Some(StateId::Off);
    }

    // A timed run is ended by the override watchdog, not by hysteresis.
    if ctx.override_expiry_ms.is_some() {
        return None;
    }

    let t = ctx.thresholds;
    if ctx.sensors.soil_pct >= t.soil_off_pct {
        info!(
            "ON: soil {}% >= {}% → done",
            ctx.sensors.soil_pct, t.soil_off_pct
        );
        return Some(StateId::Off);
    }
    if ctx.sensors.reservoir_pct < t.reservoir_min_pct {
        return Some(StateId::Off);
    }

    None
}
