//! Calibration reference values for the analog channels.
//!
//! Each channel maps its raw ADC span onto 0–100 % using two reference
//! readings.  The references are raw values captured in the field, so their
//! order is whatever the sensor produces: the capacitive soil sensor reads
//! *lower* when wet, which makes its "high" reference smaller than its "low".

use serde::{Deserialize, Serialize};

use crate::sensors::Channel;

/// Raw readings that map to 0 % (`low`) and 100 % (`high`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationRefs {
    pub low: i32,
    pub high: i32,
}

impl CalibrationRefs {
    pub const fn new(low: i32, high: i32) -> Self {
        Self { low, high }
    }

    /// `true` when the 100 % reference reads below the 0 % reference.
    pub fn is_inverted(&self) -> bool {
        self.high < self.low
    }

    /// A zero span maps every reading to 0 %.
    pub fn is_degenerate(&self) -> bool {
        self.high == self.low
    }
}

/// Which end of a channel's span a captured reading defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefPoint {
    /// 0 %: dry soil, darkness, empty reservoir.
    Low,
    /// 100 %: wet soil, bright light, full reservoir.
    High,
}

/// References for every calibrated channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationSet {
    /// Soil moisture: `low` = dry, `high` = wet.
    pub soil: CalibrationRefs,
    /// LDR: `low` = dark, `high` = bright.
    pub light: CalibrationRefs,
    /// Reservoir sensor: `low` = empty, `high` = full.
    pub reservoir: CalibrationRefs,
}

impl Default for CalibrationSet {
    fn default() -> Self {
        Self {
            soil: CalibrationRefs::new(4095, 1200),
            light: CalibrationRefs::new(381, 737),
            reservoir: CalibrationRefs::new(300, 2200),
        }
    }
}

impl CalibrationSet {
    pub fn get(&self, channel: Channel) -> CalibrationRefs {
        match channel {
            Channel::Soil => self.soil,
            Channel::Light => self.light,
            Channel::Reservoir => self.reservoir,
        }
    }

    pub fn set(&mut self, channel: Channel, refs: CalibrationRefs) {
        *self.slot(channel) = refs;
    }

    /// Overwrite one end of a channel's span.
    pub fn set_point(&mut self, channel: Channel, point: RefPoint, raw: i32) {
        let refs = self.slot(channel);
        match point {
            RefPoint::Low => refs.low = raw,
            RefPoint::High => refs.high = raw,
        }
    }

    fn slot(&mut self, channel: Channel) -> &mut CalibrationRefs {
        match channel {
            Channel::Soil => &mut self.soil,
            Channel::Light => &mut self.light,
            Channel::Reservoir => &mut self.reservoir,
        }
    }
}
