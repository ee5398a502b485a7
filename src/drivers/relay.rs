//! Pump relay driver.
//!
//! A single digital output switching a relay module that closes the pump
//! supply.  Most cheap modules energise on a LOW input; the polarity is
//! resolved here so nothing above this driver ever deals with it.
//!
//! ## Safety contract
//!
//! The pump must never run when the reservoir is low.  Enforced by the
//! safety supervisor; this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: on ESP-IDF it wraps a
//! `PinDriver`, in tests a mock pin.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::error::ActuatorError;

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    active_low: bool,
    energised: bool,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of `pin` and drive it to the released level
    /// immediately, so the pump cannot start on boot.
    pub fn new(pin: P, active_low: bool) -> Result<Self, ActuatorError> {
        let mut relay = Self {
            pin,
            active_low,
            energised: true,
        };
        relay.set(false)?;
        Ok(relay)
    }

    /// Energise (`true`) or release the relay.
    pub fn set(&mut self, energise: bool) -> Result<(), ActuatorError> {
        // Electrical level: HIGH unless (energise XOR active_low) says LOW.
        let high = energise != self.active_low;
        let res = if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        res.map_err(|_| ActuatorError::GpioWriteFailed)?;
        if self.energised != energise {
            debug!(
                "relay: {} (line {})",
                if energise { "energised" } else { "released" },
                if high { "HIGH" } else { "LOW" }
            );
        }
        self.energised = energise;
        Ok(())
    }
}
