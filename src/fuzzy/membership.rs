//! Triangular membership evaluation on a 0–255 degree scale.

use crate::config::{MembershipConfig, Triangle};
use crate::sensors::climate::ClimateReading;

/// Degree of full membership.
pub const DEGREE_MAX: u8 = 255;

/// Warmest temperature the fuzzy sets are defined over (°C).
const TEMP_DOMAIN_MAX: f32 = 50.0;

/// Membership of `x` in the triangle `(a, b, c)`.
///
/// 0 outside `(a, c)`, [`DEGREE_MAX`] at `b`, linear in between.  The outer
/// checks run first, so a zero-width side (`a == b` or `b == c`) is never
/// divided by: the coincident point reads 0 and the other side interpolates
/// normally.  Unordered breakpoints (`a > b` or `b > c`) describe no
/// triangle and yield 0 everywhere.
pub fn triangular(x: u8, a: u8, b: u8, c: u8) -> u8 {
    if a > b || b > c {
        return 0;
    }
    if x <= a || x >= c {
        return 0;
    }
    if x == b {
        return DEGREE_MAX;
    }
    let (x, a, b, c) = (u32::from(x), u32::from(a), u32::from(b), u32::from(c));
    let (num, den) = if x > b { (c - x, c - b) } else { (x - a, b - a) };
    match (num * u32::from(DEGREE_MAX)).checked_div(den) {
        Some(mu) => mu.min(u32::from(DEGREE_MAX)) as u8,
        None => 0,
    }
}

fn triangular_in(x: u8, t: Triangle) -> u8 {
    triangular(x, t.a, t.b, t.c)
}

/// The nine linguistic terms, in the order their degrees are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum FuzzySet {
    DryLow = 0,
    DryMedium = 1,
    DryHigh = 2,
    Cold = 3,
    Comfortable = 4,
    Hot = 5,
    Dark = 6,
    Overcast = 7,
    Sunny = 8,
}

impl FuzzySet {
    pub const COUNT: usize = 9;

    pub const ALL: [FuzzySet; Self::COUNT] = [
        Self::DryLow,
        Self::DryMedium,
        Self::DryHigh,
        Self::Cold,
        Self::Comfortable,
        Self::Hot,
        Self::Dark,
        Self::Overcast,
        Self::Sunny,
    ];

    fn triangle(self, cfg: &MembershipConfig) -> Triangle {
        match self {
            Self::DryLow => cfg.dry_low,
            Self::DryMedium => cfg.dry_medium,
            Self::DryHigh => cfg.dry_high,
            Self::Cold => cfg.temp_cold,
            Self::Comfortable => cfg.temp_comfortable,
            Self::Hot => cfg.temp_hot,
            Self::Dark => cfg.light_dark,
            Self::Overcast => cfg.light_overcast,
            Self::Sunny => cfg.light_sunny,
        }
    }
}

/// Crisp inputs to the membership evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyInputs {
    /// `100 - soil moisture %`.
    pub dryness: u8,
    /// Whole degrees Celsius, clamped to 0..=50.
    pub temperature: u8,
    /// Ambient light %.
    pub light: u8,
}

impl FuzzyInputs {
    /// Derive the crisp inputs from conditioned readings.  An invalid climate
    /// cache falls back to `fallback_temp_c`.
    pub fn from_readings(
        soil_pct: u8,
        light_pct: u8,
        climate: &ClimateReading,
        fallback_temp_c: f32,
    ) -> Self {
        let temp_c = if climate.valid {
            climate.temperature_c
        } else {
            fallback_temp_c
        };
        Self {
            dryness: 100 - soil_pct.min(100),
            temperature: temp_c.round().clamp(0.0, TEMP_DOMAIN_MAX) as u8,
            light: light_pct.min(100),
        }
    }

    fn variable_for(&self, set: FuzzySet) -> u8 {
        match set {
            FuzzySet::DryLow | FuzzySet::DryMedium | FuzzySet::DryHigh => self.dryness,
            FuzzySet::Cold | FuzzySet::Comfortable | FuzzySet::Hot => self.temperature,
            FuzzySet::Dark | FuzzySet::Overcast | FuzzySet::Sunny => self.light,
        }
    }
}

/// Membership degrees for all nine sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Memberships([u8; FuzzySet::COUNT]);

impl Memberships {
    /// Evaluate every set against its configured triangle.
    pub fn evaluate(inputs: &FuzzyInputs, cfg: &MembershipConfig) -> Self {
        let mut degrees = [0u8; FuzzySet::COUNT];
        for set in FuzzySet::ALL {
            degrees[set as usize] = triangular_in(inputs.variable_for(set), set.triangle(cfg));
        }
        Self(degrees)
    }

    pub fn from_degrees(degrees: [u8; FuzzySet::COUNT]) -> Self {
        Self(degrees)
    }

    pub fn with(mut self, set: FuzzySet, degree: u8) -> Self {
        self.0[set as usize] = degree;
        self
    }

    pub fn degree(&self, set: FuzzySet) -> u8 {
        self.0[set as usize]
    }

    pub fn degrees(&self) -> &[u8; FuzzySet::COUNT] {
        &self.0
    }
}
