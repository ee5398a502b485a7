//! Actuator and sensor drivers, plus one-shot hardware initialisation.

pub mod dht22;
pub mod hw_init;
pub mod relay;
