//! Rate-limited temperature / humidity cache.
//!
//! The DHT22 cannot be polled faster than about every two seconds and a
//! read blocks for several milliseconds, so the control cycle goes through
//! this cache instead of the sensor.  Implausible or failed reads never
//! surface as faults: the last good value is kept and the `valid` flag tells
//! consumers whether they are looking at real data.  Once the last good
//! value is older than the configured maximum age it stops being valid.

use log::warn;
use serde::Serialize;

use crate::app::ports::ClimatePort;

/// Plausible DHT22 operating envelope (°C), exclusive bounds.
const TEMP_MIN_C: f32 = -40.0;
const TEMP_MAX_C: f32 = 85.0;

/// One raw sample as delivered by the climate sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

impl ClimateSample {
    pub fn is_plausible(&self) -> bool {
        self.temperature_c.is_finite()
            && self.humidity_pct.is_finite()
            && (0.0..=100.0).contains(&self.humidity_pct)
            && self.temperature_c > TEMP_MIN_C
            && self.temperature_c < TEMP_MAX_C
    }
}

/// Cached climate state exposed to the rest of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub valid: bool,
    /// Clock time of the last accepted sample.
    pub last_update_ms: Option<u64>,
}

impl Default for ClimateReading {
    fn default() -> Self {
        Self {
            temperature_c: 0.0,
            humidity_pct: 0.0,
            valid: false,
            last_update_ms: None,
        }
    }
}

pub struct ClimateCache {
    reading: ClimateReading,
    last_attempt_ms: Option<u64>,
    refresh_ms: u32,
    max_age_ms: u32,
}

impl ClimateCache {
    pub fn new(refresh_ms: u32, max_age_ms: u32) -> Self {
        Self {
            reading: ClimateReading::default(),
            last_attempt_ms: None,
            refresh_ms,
            max_age_ms,
        }
    }

    /// Return the cached reading, refreshing it first if the refresh
    /// interval has passed since the last attempt.
    pub fn read_cached(&mut self, now_ms: u64, port: &mut impl ClimatePort) -> ClimateReading {
        let due = match self.last_attempt_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.refresh_ms),
        };
        if !due {
            self.expire_stale(now_ms);
            return self.reading;
        }
        self.last_attempt_ms = Some(now_ms);

        match port.read_climate() {
            Ok(sample) if sample.is_plausible() => {
                self.reading = ClimateReading {
                    temperature_c: sample.temperature_c,
                    humidity_pct: sample.humidity_pct,
                    valid: true,
                    last_update_ms: Some(now_ms),
                };
            }
            Ok(sample) => {
                warn!(
                    "climate: rejected implausible sample T={:.1} H={:.1}",
                    sample.temperature_c, sample.humidity_pct
                );
            }
            Err(e) => {
                warn!("climate: read failed ({e}), keeping last value");
            }
        }
        self.expire_stale(now_ms);
        self.reading
    }

    fn expire_stale(&mut self, now_ms: u64) {
        let Some(updated) = self.reading.last_update_ms else {
            return;
        };
        if self.reading.valid && now_ms.saturating_sub(updated) > u64::from(self.max_age_ms) {
            warn!(
                "climate: last good sample is {} ms old, marking invalid",
                now_ms - updated
            );
            self.reading.valid = false;
        }
    }
}
