//! Mock adapters for integration tests.
//!
//! Records every relay write and event so tests can assert on the full
//! history without touching real GPIO or flash.

use std::cell::Cell;

use embedded_hal::delay::DelayNs;
use irrigator::app::events::AppEvent;
use irrigator::app::ports::{
    ActuatorPort, CalibrationPort, ClimatePort, ClockPort, EventSink, SensorPort, StorageError,
};
use irrigator::calibration::CalibrationSet;
use irrigator::error::{ActuatorError, SensorError};
use irrigator::sensors::Channel;
use irrigator::sensors::climate::ClimateSample;

// ── Raw values for a wanted percentage (default calibration) ──

/// Ceiling of `pct * span / 100`, so the conditioned value lands exactly
/// on `pct` after the integer division in the conditioner.
fn offset(pct: u8, span: i32) -> i32 {
    (i32::from(pct) * span + 99) / 100
}

/// Soil: dry 4095 → 0 %, wet 1200 → 100 %.
pub fn soil_raw(pct: u8) -> u16 {
    (4095 - offset(pct, 2895)) as u16
}

/// Light: dark 381 → 0 %, bright 737 → 100 %.
pub fn light_raw(pct: u8) -> u16 {
    (381 + offset(pct, 356)) as u16
}

/// Reservoir: empty 300 → 0 %, full 2200 → 100 %.
pub fn reservoir_raw(pct: u8) -> u16 {
    (300 + offset(pct, 1900)) as u16
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub soil: u16,
    pub light: u16,
    pub reservoir: u16,
    pub climate: Result<ClimateSample, SensorError>,
    /// Every value written to the relay, oldest first.
    pub relay_writes: Vec<bool>,
    pub climate_reads: u32,
    pub fail_relay: bool,
    /// Every ADC read of this channel fails.
    pub failing_adc: Option<Channel>,
}

#[allow(dead_code)]
impl MockHardware {
    /// Moist soil, overcast, half-full reservoir, mild climate.
    pub fn new() -> Self {
        Self {
            soil: soil_raw(80),
            light: light_raw(50),
            reservoir: reservoir_raw(50),
            climate: Ok(ClimateSample {
                temperature_c: 23.0,
                humidity_pct: 55.0,
            }),
            relay_writes: Vec::new(),
            climate_reads: 0,
            fail_relay: false,
            failing_adc: None,
        }
    }

    pub fn set_soil_pct(&mut self, pct: u8) {
        self.soil = soil_raw(pct);
    }

    pub fn set_light_pct(&mut self, pct: u8) {
        self.light = light_raw(pct);
    }

    pub fn set_reservoir_pct(&mut self, pct: u8) {
        self.reservoir = reservoir_raw(pct);
    }

    /// Level of the last relay write, `false` if never written.
    pub fn pump_on(&self) -> bool {
        self.relay_writes.last().copied().unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, _ns: u32) {}
}

impl SensorPort for MockHardware {
    fn read_raw(&mut self, channel: Channel) -> Result<u16, SensorError> {
        if self.failing_adc == Some(channel) {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(match channel {
            Channel::Soil => self.soil,
            Channel::Light => self.light,
            Channel::Reservoir => self.reservoir,
        })
    }
}

impl ClimatePort for MockHardware {
    fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        self.climate_reads += 1;
        self.climate
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        if self.fail_relay {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.relay_writes.push(on);
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Manually advanced millisecond clock.
#[derive(Default)]
pub struct MockClock {
    now: Cell<u64>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn at(ms: u64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }
}

impl ClockPort for MockClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

/// Event sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MemoryStore ───────────────────────────────────────────────

/// In-memory calibration store with failure injection.
#[derive(Default)]
pub struct MemoryStore {
    pub stored: Option<CalibrationSet>,
    pub fail_with: Option<StorageError>,
    pub saves: u32,
}

#[allow(dead_code)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding(set: CalibrationSet) -> Self {
        Self {
            stored: Some(set),
            ..Self::default()
        }
    }
}

impl CalibrationPort for MemoryStore {
    fn load(&self) -> Result<Option<CalibrationSet>, StorageError> {
        match self.fail_with {
            Some(e) => Err(e),
            None => Ok(self.stored),
        }
    }

    fn save(&mut self, set: &CalibrationSet) -> Result<(), StorageError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.stored = Some(*set);
        self.saves += 1;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), StorageError> {
        if let Some(e) = self.fail_with {
            return Err(e);
        }
        self.stored = None;
        Ok(())
    }
}
