//! Unified error types for the irrigation firmware.
//!
//! Leaf errors are typed per subsystem and all variants are `Copy` so they
//! can be passed through the control cycle without allocation.  The
//! top-level [`Error`] only covers what can abort startup; once the control
//! loop runs, every failure is logged and absorbed.

use core::fmt;

use crate::app::ports::{ConfigError, StorageError};

// ---------------------------------------------------------------------------
// Startup error
// ---------------------------------------------------------------------------

/// Failures that stop the firmware before the control loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The relay could not be driven to its released level.
    Actuator(ActuatorError),
    /// The calibration store could not be opened.
    Storage(StorageError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC conversion returned an error code.
    AdcReadFailed,
    /// GPIO read or write on a sensor line failed.
    GpioFailed,
    /// The sensor did not answer within its protocol window.
    Timeout,
    /// Frame checksum did not match its payload.
    ChecksumMismatch,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed => write!(f, "ADC read failed"),
            Self::GpioFailed => write!(f, "GPIO access failed"),
            Self::Timeout => write!(f, "sensor timed out"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

impl core::error::Error for SensorError {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl core::error::Error for ActuatorError {}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Safety faults force the pump off regardless of the control logic.  They
/// are accumulated in a bitfield by the safety supervisor so further
/// interlocks can be added without changing the FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// Reservoir level below the minimum safe percentage.
    ReservoirLow = 0b0000_0001,
}

impl SafetyFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReservoirLow => write!(f, "reservoir level low"),
        }
    }
}

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
