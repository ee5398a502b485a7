//! System configuration parameters
//!
//! All tunable parameters for the irrigation controller.  The membership
//! breakpoints were tuned empirically on the prototype bed; they live here
//! rather than inside the evaluator so a different planting can ship its
//! own table.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::calibration::CalibrationSet;

/// Triangular fuzzy set `(a, b, c)`: zero at `a` and `c`, peak at `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    pub a: u8,
    pub b: u8,
    pub c: u8,
}

impl Triangle {
    pub const fn new(a: u8, b: u8, c: u8) -> Self {
        Self { a, b, c }
    }

    /// Ordered breakpoints with a non-empty support.
    pub fn is_well_formed(&self) -> bool {
        self.a <= self.b && self.b <= self.c && self.a < self.c
    }
}

/// Breakpoints for the nine fuzzy sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipConfig {
    // --- Dryness (100 - soil moisture %) ---
    pub dry_low: Triangle,
    pub dry_medium: Triangle,
    pub dry_high: Triangle,

    // --- Air temperature (°C, 0..=50) ---
    pub temp_cold: Triangle,
    pub temp_comfortable: Triangle,
    pub temp_hot: Triangle,

    // --- Ambient light (%) ---
    pub light_dark: Triangle,
    pub light_overcast: Triangle,
    pub light_sunny: Triangle,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            dry_low: Triangle::new(0, 10, 30),
            dry_medium: Triangle::new(35, 50, 65),
            dry_high: Triangle::new(70, 90, 100),

            temp_cold: Triangle::new(0, 10, 15),
            temp_comfortable: Triangle::new(18, 23, 28),
            temp_hot: Triangle::new(28, 35, 45),

            light_dark: Triangle::new(0, 5, 15),
            light_overcast: Triangle::new(40, 50, 60),
            light_sunny: Triangle::new(70, 85, 100),
        }
    }
}

impl MembershipConfig {
    fn triangles(&self) -> [(&'static str, Triangle); 9] {
        [
            ("dry_low", self.dry_low),
            ("dry_medium", self.dry_medium),
            ("dry_high", self.dry_high),
            ("temp_cold", self.temp_cold),
            ("temp_comfortable", self.temp_comfortable),
            ("temp_hot", self.temp_hot),
            ("light_dark", self.light_dark),
            ("light_overcast", self.light_overcast),
            ("light_sunny", self.light_sunny),
        ]
    }
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Pump ---
    /// Soil moisture (%) at or below which the pump starts.
    pub soil_on_pct: u8,
    /// Soil moisture (%) at or above which the pump stops.
    pub soil_off_pct: u8,
    /// Reservoir level (%) below which the pump is forced off.
    pub reservoir_min_pct: u8,
    /// Upper bound for manual runs and for the suggested duration (ms).
    pub max_pump_ms: u32,
    /// Relay module energises on a LOW output.
    pub relay_active_low: bool,

    // --- Sampling ---
    pub soil_samples: u8,
    pub light_samples: u8,
    /// The reservoir sensor is the noisiest input, so it gets more samples.
    pub reservoir_samples: u8,
    /// Pause between consecutive ADC samples (ms).
    pub inter_sample_delay_ms: u32,
    /// EMA weight of the newest reservoir sample (%).
    pub reservoir_alpha_pct: u8,

    // --- ADC ---
    /// Full-scale raw reading (12-bit ADC).
    pub adc_max: u16,
    /// Voltage at full scale.
    pub adc_vref: f32,

    // --- Climate ---
    /// Minimum spacing between DHT22 read attempts (ms).
    pub climate_refresh_ms: u32,
    /// A cached reading older than this is no longer reported valid (ms).
    pub climate_max_age_ms: u32,
    /// Temperature fed to the fuzzy engine while no valid reading exists.
    pub fallback_temperature_c: f32,

    // --- Timing ---
    /// Idle control cycle period (ms).
    pub control_loop_interval_ms: u32,
    /// Telemetry report period (ms).
    pub telemetry_interval_ms: u32,

    // --- Decision ---
    pub membership: MembershipConfig,

    /// Compiled-in calibration references, used until the store supplies others.
    pub calibration: CalibrationSet,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Pump
            soil_on_pct: 65,
            soil_off_pct: 70,
            reservoir_min_pct: 15,
            max_pump_ms: 20_000,
            relay_active_low: true,

            // Sampling
            soil_samples: 16,
            light_samples: 16,
            reservoir_samples: 24,
            inter_sample_delay_ms: 2,
            reservoir_alpha_pct: 25,

            // ADC
            adc_max: 4095,
            adc_vref: 3.3,

            // Climate
            climate_refresh_ms: 2000,
            climate_max_age_ms: 60_000,
            fallback_temperature_c: 25.0,

            // Timing
            control_loop_interval_ms: 1000,
            telemetry_interval_ms: 60_000,

            membership: MembershipConfig::default(),
            calibration: CalibrationSet::default(),
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.soil_off_pct > 100 {
            return Err(ConfigError::ValidationFailed("soil_off_pct must be 0–100"));
        }
        if self.soil_on_pct >= self.soil_off_pct {
            return Err(ConfigError::ValidationFailed(
                "soil_on_pct must be < soil_off_pct",
            ));
        }
        if self.reservoir_min_pct > 100 {
            return Err(ConfigError::ValidationFailed(
                "reservoir_min_pct must be 0–100",
            ));
        }
        if !(1_000..=600_000).contains(&self.max_pump_ms) {
            return Err(ConfigError::ValidationFailed(
                "max_pump_ms must be 1000–600000",
            ));
        }
        for samples in [self.soil_samples, self.light_samples, self.reservoir_samples] {
            if !(1..=64).contains(&samples) {
                return Err(ConfigError::ValidationFailed("sample counts must be 1–64"));
            }
        }
        if self.inter_sample_delay_ms > 50 {
            return Err(ConfigError::ValidationFailed(
                "inter_sample_delay_ms must be 0–50",
            ));
        }
        if !(1..=100).contains(&self.reservoir_alpha_pct) {
            return Err(ConfigError::ValidationFailed(
                "reservoir_alpha_pct must be 1–100",
            ));
        }
        if self.adc_max == 0 {
            return Err(ConfigError::ValidationFailed("adc_max must be > 0"));
        }
        if !(self.adc_vref > 0.0 && self.adc_vref <= 5.0) {
            return Err(ConfigError::ValidationFailed("adc_vref must be in (0, 5]"));
        }
        if !(500..=60_000).contains(&self.climate_refresh_ms) {
            return Err(ConfigError::ValidationFailed(
                "climate_refresh_ms must be 500–60000",
            ));
        }
        if self.climate_max_age_ms < self.climate_refresh_ms {
            return Err(ConfigError::ValidationFailed(
                "climate_max_age_ms must be >= climate_refresh_ms",
            ));
        }
        if !(0.0..=50.0).contains(&self.fallback_temperature_c) {
            return Err(ConfigError::ValidationFailed(
                "fallback_temperature_c must be 0–50",
            ));
        }
        if !(100..=60_000).contains(&self.control_loop_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_loop_interval_ms must be 100–60000",
            ));
        }
        if self.telemetry_interval_ms < self.control_loop_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_ms must be >= control_loop_interval_ms",
            ));
        }
        for (name, tri) in self.membership.triangles() {
            if !tri.is_well_formed() {
                log::warn!("config: membership set {name} has unordered breakpoints {tri:?}");
                return Err(ConfigError::ValidationFailed(
                    "membership breakpoints must satisfy a <= b <= c and a < c",
                ));
            }
        }
        Ok(())
    }
}
