//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the business rules for the irrigation controller:
//! cycle orchestration, manual override, calibration commands and event
//! emission.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod console;
pub mod events;
pub mod inbox;
pub mod ports;
pub mod service;
