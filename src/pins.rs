//! GPIO / peripheral pin assignments for the irrigation controller board
//! (ESP32-WROOM DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! All analog inputs sit on ADC1; ADC2 is unusable while Wi-Fi is up.

// ---------------------------------------------------------------------------
// Sensors: Analog (ADC1, 11 dB attenuation, 12-bit)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture sensor.  Reads lower when wet.
/// ADC1 channel 6.
pub const SOIL_ADC_GPIO: i32 = 34;

/// LDR / fixed-resistor divider.  Reads higher in bright light.
/// ADC1 channel 7.
pub const LIGHT_ADC_GPIO: i32 = 35;

/// Resistive reservoir level sensor.  Noisy; oversampled and smoothed.
/// ADC1 channel 3 (SENSOR_VN).
pub const RESERVOIR_ADC_GPIO: i32 = 39;

// ---------------------------------------------------------------------------
// Sensors: Digital
// ---------------------------------------------------------------------------

/// DHT22 single-wire data line, open-drain with external 10 kΩ pull-up.
pub const DHT22_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Pump relay module input.  The module energises on LOW.
pub const PUMP_RELAY_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 1;
pub const UART_RX_GPIO: i32 = 3;
