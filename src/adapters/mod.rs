//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to              |
//! |------------|--------------------|--------------------------|
//! | `hardware` | SensorPort         | ESP32 ADC1 oneshot       |
//! |            | ClimatePort        | DHT22 single-wire        |
//! |            | ActuatorPort       | Pump relay GPIO          |
//! | `log_sink` | EventSink          | Serial log output        |
//! | `nvs`      | CalibrationPort    | NVS / in-memory store    |
//! | `time`     | ClockPort          | ESP32 system timer       |

pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
