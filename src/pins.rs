//! GPIO / peripheral pin assignments for the CropWatch field node
//! (ESP32-S3).
//!
//! Single source of truth: drivers and `main` reference these constants
//! rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Analog inputs (ADC1 oneshot)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture sensor, GPIO 1.
pub const SOIL_ADC_CHANNEL: u32 = 0;
/// Battery through a 1:1 resistive divider, GPIO 2.
pub const BATTERY_ADC_CHANNEL: u32 = 1;
/// Electret microphone pre-amp (biased at mid-rail), GPIO 3.
pub const MIC_ADC_CHANNEL: u32 = 2;

/// Channels configured at boot, in index order.
pub const ADC_CHANNELS: [u32; 3] = [SOIL_ADC_CHANNEL, BATTERY_ADC_CHANNEL, MIC_ADC_CHANNEL];

/// Full-scale input at 12 dB attenuation (millivolts).
pub const ADC_FULL_SCALE_MV: u32 = 3100;
/// 12-bit conversions.
pub const ADC_MAX_RAW: u16 = 4095;

/// Vbat = Vadc × ratio.
pub const BATTERY_DIVIDER_RATIO: f32 = 2.0;

// ---------------------------------------------------------------------------
// I²C (SHT31 climate sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
pub const I2C_FREQ_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// Sensor supply
// ---------------------------------------------------------------------------

/// High-side switch feeding the soil sensor, mic pre-amp and SHT31.
pub const SENSOR_POWER_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// Status LEDs
// ---------------------------------------------------------------------------

pub const LED_GREEN_GPIO: i32 = 11;
pub const LED_RED_GPIO: i32 = 12;
