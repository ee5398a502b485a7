//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (ADC, DHT22, relay, clock, event sinks, calibration
//! storage) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics, so
//! the domain core never touches hardware directly and every test can swap
//! in a mock.

use embedded_hal::delay::DelayNs;

use crate::calibration::CalibrationSet;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Channel;
use crate::sensors::climate::ClimateSample;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Raw analog acquisition.
///
/// The delay supertrait paces oversampling; on hardware it is a busy-wait,
/// in tests a no-op or a counter.
pub trait SensorPort: DelayNs {
    /// One raw ADC sample from `channel`, `0..=adc_max`.
    fn read_raw(&mut self, channel: Channel) -> Result<u16, SensorError>;
}

/// Air temperature / humidity sensor.
pub trait ClimatePort {
    /// Blocking read of one sample.  Callers go through
    /// [`ClimateCache`](crate::sensors::climate::ClimateCache) to respect the
    /// sensor's minimum polling interval.
    fn read_climate(&mut self) -> Result<ClimateSample, SensorError>;
}

/// Monotonic millisecond clock.
pub trait ClockPort {
    /// Milliseconds since an arbitrary fixed origin.  Never goes backwards.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the pump relay.
pub trait ActuatorPort {
    /// Energise (`true`) or release the pump relay.  Polarity is the
    /// adapter's concern.
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, HTTP
/// status page, test recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Calibration port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persists the calibration reference set.
///
/// Writes MUST be atomic: a power cut mid-save leaves either the old or the
/// new set, never a mixture.  The ESP-IDF NVS API guarantees this natively.
pub trait CalibrationPort {
    /// Load the stored set.  `Ok(None)` means nothing has been saved yet.
    fn load(&self) -> Result<Option<CalibrationSet>, StorageError>;

    /// Persist `set`, replacing any previous one.
    fn save(&mut self, set: &CalibrationSet) -> Result<(), StorageError>;

    /// Erase the stored set.  `Ok(())` even if nothing was stored.
    fn reset(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`CalibrationPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Stored blob failed to deserialize.
    Corrupted,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "stored data corrupted"),
        }
    }
}

impl core::error::Error for StorageError {}
