//! Sensor subsystem: signal conditioning and the aggregating
//! [`SignalConditioner`].
//!
//! The conditioner pulls raw samples through the [`SensorPort`], maps them
//! onto calibrated percentages, smooths the reservoir channel, and refreshes
//! the climate cache.  It produces one [`ConditionedReadings`] per control
//! cycle.
//!
//! A channel whose ADC reads all fail keeps its last good raw value.  Before
//! any good value exists it reports the safe end of its span: wet soil, an
//! empty reservoir, darkness.  The pump therefore never runs on a reading
//! that was never taken.

pub mod climate;
pub mod signal;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::app::ports::{ClimatePort, SensorPort};
use crate::calibration::{CalibrationRefs, CalibrationSet};
use crate::config::SystemConfig;
use crate::error::SensorError;
use climate::{ClimateCache, ClimateReading};
use signal::{acquire_averaged, to_percent_directional, to_voltage, SmoothingFilter};

/// Physical analog inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Capacitive soil-moisture sensor.
    Soil,
    /// LDR divider.
    Light,
    /// Reservoir level sensor.
    Reservoir,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Soil, Channel::Light, Channel::Reservoir];

    pub fn name(self) -> &'static str {
        match self {
            Self::Soil => "soil",
            Self::Light => "light",
            Self::Reservoir => "reservoir",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Soil => 0,
            Self::Light => 1,
            Self::Reservoir => 2,
        }
    }

    /// Raw value reported while the channel has never been read.
    fn safe_default(self, refs: CalibrationRefs) -> u16 {
        let raw = match self {
            // Wet soil asks for no water.
            Self::Soil => refs.high,
            // Empty reservoir trips the fail-safe.
            Self::Reservoir => refs.low,
            Self::Light => refs.low,
        };
        raw.clamp(0, i32::from(u16::MAX)) as u16
    }
}

/// One channel after conditioning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelReading {
    /// Averaged raw ADC value (smoothed for the reservoir).
    pub raw: u16,
    pub voltage: f32,
    /// Calibrated level, 0–100.
    pub percent: u8,
    /// References the percentage was computed against.
    pub calibration: CalibrationRefs,
    /// `false` when this cycle's ADC reads failed and `raw` is held over.
    pub fresh: bool,
}

/// Everything the decision pipeline consumes for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConditionedReadings {
    pub soil: ChannelReading,
    pub light: ChannelReading,
    pub reservoir: ChannelReading,
    pub climate: ClimateReading,
}

/// Owns the long-lived conditioning state: the reservoir EMA and the
/// climate cache.
pub struct SignalConditioner {
    soil_samples: u8,
    light_samples: u8,
    reservoir_samples: u8,
    inter_sample_delay_ms: u32,
    adc_max: u16,
    adc_vref: f32,
    reservoir_filter: SmoothingFilter,
    climate: ClimateCache,
    last_good: [Option<u16>; 3],
}

impl SignalConditioner {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            soil_samples: config.soil_samples,
            light_samples: config.light_samples,
            reservoir_samples: config.reservoir_samples,
            inter_sample_delay_ms: config.inter_sample_delay_ms,
            adc_max: config.adc_max,
            adc_vref: config.adc_vref,
            reservoir_filter: SmoothingFilter::new(config.reservoir_alpha_pct),
            climate: ClimateCache::new(config.climate_refresh_ms, config.climate_max_age_ms),
            last_good: [None; 3],
        }
    }

    /// Acquire and condition every channel.
    pub fn condition(
        &mut self,
        hw: &mut (impl SensorPort + ClimatePort),
        now_ms: u64,
        cal: &CalibrationSet,
    ) -> ConditionedReadings {
        let (soil_raw, soil_fresh) = self.sample(hw, Channel::Soil, cal.soil);
        let (light_raw, light_fresh) = self.sample(hw, Channel::Light, cal.light);
        let (reservoir_raw, reservoir_fresh) =
            self.sample(hw, Channel::Reservoir, cal.reservoir);
        let reservoir_smoothed = if reservoir_fresh {
            self.reservoir_filter.update(reservoir_raw)
        } else {
            self.reservoir_filter.value().unwrap_or(reservoir_raw)
        };

        let climate = self.climate.read_cached(now_ms, hw);

        ConditionedReadings {
            soil: self.reading(soil_raw, cal.soil, soil_fresh),
            light: self.reading(light_raw, cal.light, light_fresh),
            reservoir: self.reading(reservoir_smoothed, cal.reservoir, reservoir_fresh),
            climate,
        }
    }

    /// Averaged raw value for one channel, bypassing the EMA.  Used when
    /// capturing a calibration reference from the current reading.
    pub fn acquire(
        &self,
        hw: &mut impl SensorPort,
        channel: Channel,
    ) -> Result<u16, SensorError> {
        let count = match channel {
            Channel::Soil => self.soil_samples,
            Channel::Light => self.light_samples,
            Channel::Reservoir => self.reservoir_samples,
        };
        acquire_averaged(hw, channel, count, self.inter_sample_delay_ms)
    }

    /// Acquire one channel, falling back to the last good value (or the
    /// channel's safe default) when every sample fails.
    fn sample(
        &mut self,
        hw: &mut impl SensorPort,
        channel: Channel,
        refs: CalibrationRefs,
    ) -> (u16, bool) {
        match self.acquire(hw, channel) {
            Ok(raw) => {
                self.last_good[channel.index()] = Some(raw);
                (raw, true)
            }
            Err(e) => {
                let held = self.last_good[channel.index()];
                let raw = held.unwrap_or_else(|| channel.safe_default(refs));
                warn!(
                    "sensors: {} read failed ({e}), using {} raw={raw}",
                    channel.name(),
                    if held.is_some() { "last good" } else { "safe default" }
                );
                (raw, false)
            }
        }
    }

    fn reading(&self, raw: u16, refs: CalibrationRefs, fresh: bool) -> ChannelReading {
        ChannelReading {
            raw,
            voltage: to_voltage(raw, self.adc_max, self.adc_vref),
            percent: to_percent_directional(i32::from(raw), refs.low, refs.high),
            calibration: refs,
            fresh,
        }
    }
}
