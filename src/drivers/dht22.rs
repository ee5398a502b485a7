//! DHT22 (AM2302) temperature / humidity sensor.
//!
//! Single-wire protocol, bit-banged over one open-drain GPIO:
//!
//! ```text
//!  host  ‾‾‾\________________/‾‾‾‾‾‾‾‾  (≥1 ms low start, release)
//!  dht                         \__80__/‾‾80‾‾\_50_/‾26 or 70‾\_50_/ ...
//!                                  response          bit 0 / bit 1
//! ```
//!
//! 40 bits follow the response: humidity ×10 (16 bits), temperature ×10
//! (15 bits + sign in the MSB), checksum (low byte of the sum of the other
//! four).  A bit is 1 when its high phase outlasts the preceding 50 µs low
//! phase, which keeps decoding independent of the polling loop's speed.
//!
//! The sensor must not be polled more often than every 2 s; callers go
//! through [`ClimateCache`](crate::sensors::climate::ClimateCache).

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::ClimatePort;
use crate::error::SensorError;
use crate::sensors::climate::ClimateSample;

/// Host start pulse (µs).  Datasheet minimum is 1 ms.
const START_LOW_US: u32 = 1_200;
/// Longest any single phase is allowed to last (µs).
const PHASE_TIMEOUT_US: u32 = 120;

/// Decode a raw 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<ClimateSample, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]);
    let magnitude = u16::from_be_bytes([frame[2] & 0x7F, frame[3]]);
    let mut temperature = f32::from(magnitude) / 10.0;
    if frame[2] & 0x80 != 0 {
        temperature = -temperature;
    }

    Ok(ClimateSample {
        temperature_c: temperature,
        humidity_pct: f32::from(humidity) / 10.0,
    })
}

/// Bit-banged DHT22 reader.
///
/// `P` must be able to both drive and sense the line (an open-drain
/// input/output pin with a pull-up).
pub struct Dht22<P, D> {
    pin: P,
    delay: D,
}

impl<P, D> Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    pub fn new(mut pin: P, delay: D) -> Self {
        // Idle high so the sensor is not held in reset.
        let _ = pin.set_high();
        Self { pin, delay }
    }

    /// Run one transaction and return the raw frame.
    pub fn read_frame(&mut self) -> Result<[u8; 5], SensorError> {
        self.pin.set_low().map_err(|_| SensorError::GpioFailed)?;
        self.delay.delay_us(START_LOW_US);
        self.pin.set_high().map_err(|_| SensorError::GpioFailed)?;

        // Response: pull-up settles, sensor answers low then high.
        self.wait_while(true)?;
        self.wait_while(false)?;
        self.wait_while(true)?;

        let mut frame = [0u8; 5];
        for bit in 0..40 {
            let low = self.wait_while(false)?;
            let high = self.wait_while(true)?;
            if high > low {
                frame[bit / 8] |= 1 << (7 - bit % 8);
            }
        }
        Ok(frame)
    }

    /// Microseconds the line stays at `high`.
    fn wait_while(&mut self, high: bool) -> Result<u32, SensorError> {
        let mut elapsed = 0;
        while self.pin.is_high().map_err(|_| SensorError::GpioFailed)? == high {
            if elapsed >= PHASE_TIMEOUT_US {
                return Err(SensorError::Timeout);
            }
            self.delay.delay_us(1);
            elapsed += 1;
        }
        Ok(elapsed)
    }
}

impl<P, D> ClimatePort for Dht22<P, D>
where
    P: InputPin + OutputPin,
    D: DelayNs,
{
    fn read_climate(&mut self) -> Result<ClimateSample, SensorError> {
        let frame = self.read_frame()?;
        decode_frame(frame)
    }
}
