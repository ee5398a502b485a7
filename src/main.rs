//! Irrigator Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single poll-driven control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter  Monotonic   │
//! │  (Sensor+Climate+Pump)  (EventSink)    (Calib.)    (Clock)     │
//! │  console thread ──▶ CommandInbox                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Conditioning · Fuzzy · Safety · Pump FSM              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::io::{BufRead, ErrorKind};
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::PinDriver;
use esp_idf_svc::hal::peripherals::Peripherals;
use log::{info, warn};

use irrigator::adapters::hardware::HardwareAdapter;
use irrigator::adapters::log_sink::LogEventSink;
use irrigator::adapters::nvs::NvsAdapter;
use irrigator::adapters::time::MonotonicClock;
use irrigator::app::console::parse_line;
use irrigator::app::events::AppEvent;
use irrigator::app::inbox::CommandInbox;
use irrigator::app::ports::{ClockPort, EventSink};
use irrigator::app::service::AppService;
use irrigator::config::SystemConfig;
use irrigator::drivers::dht22::Dht22;
use irrigator::drivers::relay::RelayDriver;
use irrigator::error::Error;
use irrigator::{drivers, pins};

/// Idle-loop granularity: how often the inbox and the override expiry are
/// polled between control cycles.
const POLL_MS: u32 = 50;

/// Commands from the console thread, drained by the control loop.
static INBOX: CommandInbox = CommandInbox::new();

// ── Console ───────────────────────────────────────────────────
//
// Reads lines from the debug UART and queues them as commands.  The VFS
// console is non-blocking, so an empty read just sleeps and retries.

fn spawn_console() -> Result<()> {
    std::thread::Builder::new()
        .name("console".into())
        .stack_size(6 * 1024)
        .spawn(|| {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                match stdin.lock().read_line(&mut line) {
                    Ok(0) => std::thread::sleep(Duration::from_millis(100)),
                    Ok(_) if line.ends_with('\n') => {
                        match parse_line(&line) {
                            Ok(cmd) => {
                                if INBOX.submit(cmd).is_err() {
                                    warn!("console: inbox full, dropped {:?}", cmd);
                                }
                            }
                            Err(e) => warn!("console: {} in {:?}", e, line.trim()),
                        }
                        line.clear();
                    }
                    // Partial line; keep accumulating.
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::WouldBlock => {
                        std::thread::sleep(Duration::from_millis(100));
                    }
                    Err(e) => {
                        warn!("console: read error {}", e);
                        line.clear();
                        std::thread::sleep(Duration::from_millis(500));
                    }
                }
            }
        })?;
    Ok(())
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Irrigator v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    drivers::hw_init::init_peripherals().map_err(|e| {
        log::error!("HAL init failed: {}", e);
        Error::Init("adc")
    })?;

    let peripherals = Peripherals::take()?;
    let relay_pin = PinDriver::output(peripherals.pins.gpio26)?;
    let dht_pin = PinDriver::input_output_od(peripherals.pins.gpio22)?;
    info!(
        "Pins: relay=GPIO{} dht22=GPIO{} soil=GPIO{} light=GPIO{} reservoir=GPIO{}",
        pins::PUMP_RELAY_GPIO,
        pins::DHT22_GPIO,
        pins::SOIL_ADC_GPIO,
        pins::LIGHT_ADC_GPIO,
        pins::RESERVOIR_ADC_GPIO,
    );

    // ── 3. Configuration and service ──────────────────────────
    let config = SystemConfig::default();
    let relay = RelayDriver::new(relay_pin, config.relay_active_low).map_err(Error::from)?;
    let dht = Dht22::new(dht_pin, Ets);
    let mut hw = HardwareAdapter::new(relay, Ets, dht);

    let mut nvs = NvsAdapter::new().map_err(Error::from)?;
    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    let cycle_ms = u64::from(config.control_loop_interval_ms);
    let telemetry_ms = u64::from(config.telemetry_interval_ms);
    let mut app = AppService::new(config).map_err(Error::from)?;
    app.start(&nvs, &mut sink);

    spawn_console()?;
    info!("System ready. Entering control loop.");

    // ── 4. Control loop ───────────────────────────────────────
    let mut last_cycle: Option<u64> = None;
    let mut last_telemetry: Option<u64> = None;

    loop {
        app.drain_inbox(&INBOX, &mut hw, &mut nvs, &clock, &mut sink);

        let now = clock.now_ms();
        if last_cycle.is_none_or(|t| now.saturating_sub(t) >= cycle_ms) {
            let snapshot = app.tick(&mut hw, &clock, &mut sink);
            last_cycle = Some(now);

            if last_telemetry.is_none_or(|t| now.saturating_sub(t) >= telemetry_ms) {
                sink.emit(&AppEvent::Telemetry(snapshot));
                last_telemetry = Some(now);
            }
        } else {
            app.poll_override(&mut hw, &clock, &mut sink);
        }

        FreeRtos::delay_ms(POLL_MS);
    }
}
