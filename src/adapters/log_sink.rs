//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).  Telemetry is
//! emitted as one JSON object per line so a host script can tail it.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::Channel;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {}", json),
                Err(e) => warn!("TELEM | encode failed: {}", e),
            },
            AppEvent::PumpChanged { from, to, cause } => {
                info!("PUMP  | {:?} -> {:?} ({:?})", from, to, cause);
            }
            AppEvent::FailSafeTripped { reservoir_pct } => {
                warn!("SAFE  | reservoir low ({}%), pump locked off", reservoir_pct);
            }
            AppEvent::FailSafeCleared { reservoir_pct } => {
                info!("SAFE  | reservoir recovered ({}%)", reservoir_pct);
            }
            AppEvent::OverrideStarted { duration_ms } => match duration_ms {
                Some(ms) => info!("MANUAL| pump on for {} ms", ms),
                None => info!("MANUAL| pump on, no expiry"),
            },
            AppEvent::OverrideExpired => {
                info!("MANUAL| timed run expired");
            }
            AppEvent::CalibrationChanged(set) => {
                info!(
                    "CAL   | soil={}/{} light={}/{} reservoir={}/{}",
                    set.soil.low,
                    set.soil.high,
                    set.light.low,
                    set.light.high,
                    set.reservoir.low,
                    set.reservoir.high,
                );
            }
            AppEvent::CalibrationReport(set) => {
                for channel in Channel::ALL {
                    let refs = set.get(channel);
                    info!(
                        "CAL   | {:<9} 0%={:<5} 100%={:<5}{}",
                        channel.name(),
                        refs.low,
                        refs.high,
                        if refs.is_inverted() { " (inverted)" } else { "" }
                    );
                }
            }
            AppEvent::CalibrationStoreFailed(e) => {
                warn!("CAL   | store error: {}", e);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
        }
    }
}
