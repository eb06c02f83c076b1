//! One-shot ADC initialisation and raw conversions.
//!
//! Configures ADC1 in oneshot mode for the analog channels listed in
//! [`pins::ADC_CHANNELS`] using raw ESP-IDF sys calls.  Called once from
//! `main()` before the first cycle.  Host builds read from per-channel
//! simulation atomics instead.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::error::SensorError;
use crate::pins;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

// ── Error type ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={rc})"),
        }
    }
}

impl core::error::Error for HwInitError {}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: `ADC1_HANDLE` is written once in `init_peripherals()` before the
/// first cycle and only read afterwards, all from the main task.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: single write at boot, see `adc1_handle`.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in pins::ADC_CHANNELS {
        // SAFETY: the unit handle is valid after the call above.
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured (CH0=soil, CH1=battery, CH2=mic)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped");
    Ok(())
}

/// One raw 12-bit conversion.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: see `adc1_handle`; the channel was configured at boot.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::Adc);
    }
    u16::try_from(raw).map_err(|_| SensorError::Adc)
}

// ── Simulation (host) ─────────────────────────────────────────

/// Soil ≈ 2000 mV (50 % with default calibration), battery ≈ 3.9 V,
/// microphone at mid-rail (silence).
#[cfg(not(target_os = "espidf"))]
static SIM_ADC_RAW: [AtomicU16; 3] = [
    AtomicU16::new(2642),
    AtomicU16::new(2576),
    AtomicU16::new(2048),
];
#[cfg(not(target_os = "espidf"))]
static SIM_ADC_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_raw(channel: u32, raw: u16) {
    if let Some(slot) = SIM_ADC_RAW.get(channel as usize) {
        slot.store(raw.min(pins::ADC_MAX_RAW), Ordering::Relaxed);
    }
}

/// Make every simulated conversion fail.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_fault(fault: bool) {
    SIM_ADC_FAULT.store(fault, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    if SIM_ADC_FAULT.load(Ordering::Relaxed) {
        return Err(SensorError::Adc);
    }
    SIM_ADC_RAW
        .get(channel as usize)
        .map(|slot| slot.load(Ordering::Relaxed))
        .ok_or(SensorError::Adc)
}

// ── Conversions ───────────────────────────────────────────────

/// Linear raw → millivolts at 12 dB attenuation.
pub fn raw_to_millivolts(raw: u16) -> u16 {
    let raw = u32::from(raw.min(pins::ADC_MAX_RAW));
    let mv = raw * pins::ADC_FULL_SCALE_MV / u32::from(pins::ADC_MAX_RAW);
    mv as u16
}
