//! Signal conditioning primitives: oversampling, scaling, calibration
//! mapping, and exponential smoothing.
//!
//! Everything except [`acquire_averaged`] is a pure function so the maths
//! can be exercised without a port.

use crate::app::ports::SensorPort;
use crate::error::SensorError;

use super::Channel;

/// Read `count` raw samples from `channel`, pausing `delay_ms` between
/// reads, and return the integer mean of those that succeeded.
///
/// Oversampling knocks down the single-ended ADC noise on the ESP32.
/// Failed conversions are left out of the mean rather than counted as 0.
/// If no sample succeeds (including a count of zero) the channel has no
/// reading this cycle.
pub fn acquire_averaged(
    port: &mut impl SensorPort,
    channel: Channel,
    count: u8,
    delay_ms: u32,
) -> Result<u16, SensorError> {
    let mut acc: u32 = 0;
    let mut good: u32 = 0;
    let mut last_err = SensorError::AdcReadFailed;
    for _ in 0..count {
        match port.read_raw(channel) {
            Ok(raw) => {
                acc += u32::from(raw);
                good += 1;
            }
            Err(e) => last_err = e,
        }
        if delay_ms > 0 {
            port.delay_ms(delay_ms);
        }
    }
    match acc.checked_div(good) {
        Some(mean) => Ok(mean as u16),
        None => Err(last_err),
    }
}

/// Linear scale of a raw reading onto `0..=vref` volts.
pub fn to_voltage(raw: u16, adc_max: u16, vref: f32) -> f32 {
    if adc_max == 0 {
        return 0.0;
    }
    f32::from(raw) * vref / f32::from(adc_max)
}

/// Map `raw` onto 0–100 % between two references, whichever way round
/// they are.
///
/// `high_ref > low_ref` gives a rising curve; otherwise the curve is
/// inverted.  Equal references have no span and map to 0.
pub fn to_percent_directional(raw: i32, low_ref: i32, high_ref: i32) -> u8 {
    if high_ref == low_ref {
        return 0;
    }
    let (raw, low, high) = (i64::from(raw), i64::from(low_ref), i64::from(high_ref));
    let pct = if high > low {
        (raw - low) * 100 / (high - low)
    } else {
        (low - raw) * 100 / (low - high)
    };
    pct.clamp(0, 100) as u8
}

/// Integer exponential moving average, `alpha_pct` being the weight of the
/// new sample.
///
/// Integer truncation means a constant input is approached from either side
/// but the state can settle up to `100 / alpha_pct` counts short of it.
pub fn smooth(prev: u16, sample: u16, alpha_pct: u8) -> u16 {
    let alpha = u32::from(alpha_pct.clamp(1, 100));
    ((u32::from(prev) * (100 - alpha) + u32::from(sample) * alpha) / 100) as u16
}

/// EMA accumulator for one noisy channel.
///
/// Seeded with the first sample so the reservoir does not read as empty
/// (and trip the fail-safe) while the filter warms up from zero.
#[derive(Debug, Clone, Copy)]
pub struct SmoothingFilter {
    state: Option<u16>,
    alpha_pct: u8,
}

impl SmoothingFilter {
    pub fn new(alpha_pct: u8) -> Self {
        Self {
            state: None,
            alpha_pct,
        }
    }

    /// Fold in a new sample and return the filtered value.
    pub fn update(&mut self, sample: u16) -> u16 {
        let next = match self.state {
            Some(prev) => smooth(prev, sample, self.alpha_pct),
            None => sample,
        };
        self.state = Some(next);
        next
    }

    pub fn value(&self) -> Option<u16> {
        self.state
    }
}
