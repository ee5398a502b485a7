//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (status page,
//! serial console, a companion app) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::app::ports::StorageError;
use crate::calibration::{CalibrationRefs, RefPoint};
use crate::error::SensorError;
use crate::sensors::Channel;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Manual pump control.  `on: true` starts a run that ends after
    /// `duration_ms` (default and ceiling `max_pump_ms`; `Some(0)` means no
    /// expiry).  `on: false` stops the pump and cancels any running override.
    Pump { on: bool, duration_ms: Option<u32> },

    /// Take a fresh averaged reading of `channel` and store it as one end of
    /// its calibration span.
    CaptureReference { channel: Channel, point: RefPoint },

    /// Replace both references of a channel.
    SetCalibration { channel: Channel, refs: CalibrationRefs },

    /// Persist the current calibration set.
    SaveCalibration,

    /// Replace the current calibration with the stored one, if any.
    LoadCalibration,

    /// Erase the stored set and return to compiled-in defaults.
    ResetCalibration,

    /// Report the active references.
    ShowCalibration,
}

/// What a command did, for the adapter that submitted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    PumpOn,
    PumpOff,
    /// The command was not applied; the reason is for display.
    Refused(&'static str),
    CalibrationUpdated,
    /// The active references were emitted as an event.
    Reported,
    /// A capture could not read its channel; calibration unchanged.
    SensorFailed(SensorError),
    Saved,
    Loaded,
    /// Load found nothing stored; current values kept.
    NoData,
    Reset,
    StoreFailed(StorageError),
}
