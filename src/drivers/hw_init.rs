//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC1 oneshot unit and its three analog channels using
//! raw ESP-IDF sys calls.  Called once from `main()` before the control
//! loop starts.  On the host the ADC is simulated by a table of atomics
//! that tests write through [`sim_set_adc`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::error::SensorError;
use crate::sensors::Channel;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    AdcChannelFailed { channel: u32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::AdcChannelFailed { channel, rc } => {
                write!(f, "ADC1 channel {} config failed (rc={})", channel, rc)
            }
        }
    }
}

impl core::error::Error for HwInitError {}

// ── Channel map ───────────────────────────────────────────────

/// ADC1 channel for GPIO34 (soil).
pub const ADC1_CH_SOIL: u32 = 6;
/// ADC1 channel for GPIO35 (LDR).
pub const ADC1_CH_LIGHT: u32 = 7;
/// ADC1 channel for GPIO39 (reservoir).
pub const ADC1_CH_RESERVOIR: u32 = 3;

/// ADC1 channel wired to a logical input.
pub const fn adc_channel_for(channel: Channel) -> u32 {
    match channel {
        Channel::Soil => ADC1_CH_SOIL,
        Channel::Light => ADC1_CH_LIGHT,
        Channel::Reservoir => ADC1_CH_RESERVOIR,
    }
}

#[cfg(target_os = "espidf")]
use log::{info, warn};

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// control-loop ADC read path.  No concurrent access is possible because
/// `init_adc()` completes before the control loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 11 dB (DB_12 in IDF 5.x) gives the full 0–3.3 V span.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [ADC1_CH_SOIL, ADC1_CH_LIGHT, ADC1_CH_RESERVOIR] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcChannelFailed { channel, rc: ret });
        }
    }

    info!("hw_init: ADC1 configured (CH6=soil, CH7=light, CH3=reservoir)");
    Ok(())
}

/// One raw 12-bit sample.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: single-threaded control-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        warn!("hw_init: ADC1 CH{} read failed (rc={})", channel, ret);
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.clamp(0, 4095) as u16)
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU16, AtomicU32, Ordering};

    use super::{ADC1_CH_LIGHT, ADC1_CH_RESERVOIR, ADC1_CH_SOIL};
    use crate::error::SensorError;

    static SOIL: AtomicU16 = AtomicU16::new(0);
    static LIGHT: AtomicU16 = AtomicU16::new(0);
    static RESERVOIR: AtomicU16 = AtomicU16::new(0);
    /// Bit `n` set: ADC1 channel `n` fails every read.
    static FAULTED: AtomicU32 = AtomicU32::new(0);

    fn slot(channel: u32) -> Option<&'static AtomicU16> {
        match channel {
            ADC1_CH_SOIL => Some(&SOIL),
            ADC1_CH_LIGHT => Some(&LIGHT),
            ADC1_CH_RESERVOIR => Some(&RESERVOIR),
            _ => None,
        }
    }

    fn bit(channel: u32) -> u32 {
        1u32.checked_shl(channel).unwrap_or(0)
    }

    pub fn read(channel: u32) -> Result<u16, SensorError> {
        if FAULTED.load(Ordering::Relaxed) & bit(channel) != 0 {
            return Err(SensorError::AdcReadFailed);
        }
        slot(channel)
            .map(|a| a.load(Ordering::Relaxed))
            .ok_or(SensorError::AdcReadFailed)
    }

    pub fn set_fault(channel: u32, faulted: bool) {
        if faulted {
            FAULTED.fetch_or(bit(channel), Ordering::Relaxed);
        } else {
            FAULTED.fetch_and(!bit(channel), Ordering::Relaxed);
        }
    }

    pub fn set(channel: u32, raw: u16) {
        if let Some(a) = slot(channel) {
            a.store(raw, Ordering::Relaxed);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    sim::read(channel)
}

/// Inject a raw ADC value for host simulation.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: Channel, raw: u16) {
    sim::set(adc_channel_for(channel), raw.min(4095));
}

/// Make every simulated read of `channel` fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_fault(channel: Channel, faulted: bool) {
    sim::set_fault(adc_channel_for(channel), faulted);
}
