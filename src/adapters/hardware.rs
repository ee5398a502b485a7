//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the pump relay, the climate sensor, and a delay source, and reads
//! the analog channels through [`hw_init::adc1_read`].  This is the only
//! module in the system that touches actual hardware.  On non-espidf
//! targets the ADC is the atomics-backed simulation in `hw_init`.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::{ActuatorPort, ClimatePort, SensorPort};
use crate::drivers::hw_init::{adc1_read, adc_channel_for};
use crate::drivers::relay::RelayDriver;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Channel;
use crate::sensors::climate::ClimateSample;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<R: OutputPin, D: DelayNs, C: ClimatePort> {
    relay: RelayDriver<R>,
    delay: D,
    climate: C,
}

impl<R: OutputPin, D: DelayNs, C: ClimatePort> HardwareAdapter<R, D, C> {
    pub fn new(relay: RelayDriver<R>, delay: D, climate: C) -> Self {
        Self {
            relay,
            delay,
            climate,
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<R: OutputPin, D: DelayNs, C: ClimatePort> DelayNs for HardwareAdapter<R, D, C> {
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }
}

impl<R: OutputPin, D: DelayNs, C: ClimatePort> SensorPort for HardwareAdapter<R, D, C> {
    fn read_raw(&mut self, channel: Channel) -> Result<u16, SensorError> {
        adc1_read(adc_channel_for(channel))
    }
}

impl<R: OutputPin, D: DelayNs, C: ClimatePort> ClimatePort for HardwareAdapter<R, D, C> {
    fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        self.climate.read_climate()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<R: OutputPin, D: DelayNs, C: ClimatePort> ActuatorPort for HardwareAdapter<R, D, C> {
    fn set_pump(&mut self, on: bool) -> Result<(), ActuatorError> {
        self.relay.set(on)
    }
}
