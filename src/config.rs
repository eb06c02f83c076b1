//! System configuration parameters
//!
//! All tunable parameters for the CropWatch field node.  Defaults match the
//! deployed firmware; a JSON blob can override them at provisioning time.
//! Invalid values are rejected, never clamped.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Largest smoothing window a [`FeatureExtractor`](crate::ml::features::FeatureExtractor)
/// can hold per channel.
pub const MAX_SMOOTHING_WINDOW: u8 = 8;

/// Upper bound on `alert_max_retries`.
pub const MAX_ALERT_RETRIES: u8 = 10;

/// How long the device sleeps between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepMode {
    /// Light sleep for `sleep_short_ms`.
    Short,
    /// Deep sleep for `sleep_deep_ms`.
    Deep,
}

/// What to do with a sample that fails plausibility validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutOfRangePolicy {
    /// Skip classification for this cycle and go straight to sleep.
    Skip,
    /// Classify anyway; the cycle is flagged in the event stream.
    Proceed,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Classification ---
    /// Winning class score must be strictly above this to alert (0-1)
    pub confidence_threshold: f32,
    /// Inference time budget (microseconds)
    pub inference_budget_us: u32,
    /// Scratch arena handed to the inference engine (bytes)
    pub tensor_arena_bytes: usize,

    // --- Sensing ---
    /// Nominal time between pipeline passes (milliseconds)
    pub sensor_read_interval_ms: u32,
    /// Per-channel moving-mean window (1 = no smoothing)
    pub smoothing_window: u8,
    /// Policy for implausible samples
    pub out_of_range_policy: OutOfRangePolicy,

    // --- Power ---
    pub sleep_mode: SleepMode,
    /// Light sleep duration (milliseconds)
    pub sleep_short_ms: u32,
    /// Deep sleep duration (milliseconds)
    pub sleep_deep_ms: u32,
    /// Battery below this voltage raises a low-battery alert
    pub battery_low_v: f32,
    /// Battery at or below this voltage forces deep sleep
    pub battery_critical_v: f32,
    /// Check battery every N cycles
    pub battery_check_every_cycles: u32,

    // --- Alerts ---
    /// Minimum time between two delivered alerts, any kind (milliseconds)
    pub min_alert_interval_ms: u32,
    /// Delivery attempts for a failed alert, across cycles
    pub alert_max_retries: u8,
    /// Minimum wait before re-attempting a failed alert (milliseconds)
    pub alert_retry_interval_ms: u32,
    /// Transport connect timeout (milliseconds)
    pub connect_timeout_ms: u32,
    /// Back-off after a failed Wi-Fi connect before trying again (milliseconds, 0 = none)
    pub wifi_retry_interval_ms: u32,
    pub alert_host: heapless::String<64>,
    pub alert_port: u16,
    pub alert_path: heapless::String<64>,

    // --- Environmental warnings ---
    pub temperature_high_c: f32,
    pub temperature_low_c: f32,
    pub humidity_high_pct: f32,
    pub humidity_low_pct: f32,
    pub soil_moisture_low_pct: f32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut alert_host = heapless::String::new();
        let _ = alert_host.push_str("api.krishirakshak.com");
        let mut alert_path = heapless::String::new();
        let _ = alert_path.push_str("/api/v1/alerts");

        Self {
            // Classification
            confidence_threshold: 0.70,
            inference_budget_us: 50_000, // 50 ms
            tensor_arena_bytes: 20 * 1024,

            // Sensing
            sensor_read_interval_ms: 30_000,
            smoothing_window: 1,
            out_of_range_policy: OutOfRangePolicy::Skip,

            // Power
            sleep_mode: SleepMode::Short,
            sleep_short_ms: 30_000,  // 30 s
            sleep_deep_ms: 300_000,  // 5 min
            battery_low_v: 3.5,
            battery_critical_v: 3.2,
            battery_check_every_cycles: 120, // 1 h at 30 s cycles

            // Alerts
            min_alert_interval_ms: 300_000, // 5 min
            alert_max_retries: 3,
            alert_retry_interval_ms: 5_000,
            connect_timeout_ms: 10_000,
            wifi_retry_interval_ms: 60_000, // 1 min
            alert_host,
            alert_port: 443,
            alert_path,

            // Environmental warnings
            temperature_high_c: 40.0,
            temperature_low_c: 5.0,
            humidity_high_pct: 90.0,
            humidity_low_pct: 20.0,
            soil_moisture_low_pct: 25.0,
        }
    }
}

impl SystemConfig {
    /// Parse a JSON configuration blob and validate it.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.confidence_threshold;
        if !t.is_finite() || t <= 0.0 || t >= 1.0 {
            return Err(ConfigError::ValidationFailed(
                "confidence_threshold must be in (0, 1)",
            ));
        }
        if self.inference_budget_us == 0 {
            return Err(ConfigError::ValidationFailed("inference_budget_us must be > 0"));
        }
        if self.tensor_arena_bytes == 0 {
            return Err(ConfigError::ValidationFailed("tensor_arena_bytes must be > 0"));
        }
        if self.sensor_read_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_read_interval_ms must be > 0",
            ));
        }
        if self.smoothing_window == 0 || self.smoothing_window > MAX_SMOOTHING_WINDOW {
            return Err(ConfigError::ValidationFailed(
                "smoothing_window must be in 1..=8",
            ));
        }
        if self.sleep_short_ms == 0 || self.sleep_deep_ms < self.sleep_short_ms {
            return Err(ConfigError::ValidationFailed(
                "sleep durations must satisfy 0 < short <= deep",
            ));
        }
        if !(self.battery_critical_v.is_finite() && self.battery_low_v.is_finite())
            || self.battery_critical_v <= 0.0
            || self.battery_critical_v >= self.battery_low_v
        {
            return Err(ConfigError::ValidationFailed(
                "battery thresholds must satisfy 0 < critical < low",
            ));
        }
        if self.battery_check_every_cycles == 0 {
            return Err(ConfigError::ValidationFailed(
                "battery_check_every_cycles must be > 0",
            ));
        }
        if self.alert_max_retries > MAX_ALERT_RETRIES {
            return Err(ConfigError::ValidationFailed(
                "alert_max_retries must be in 0..=10",
            ));
        }
        if self.alert_retry_interval_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "alert retry interval and connect timeout must be > 0",
            ));
        }
        if self.alert_host.is_empty() || !self.alert_path.starts_with('/') {
            return Err(ConfigError::ValidationFailed(
                "alert endpoint needs a host and an absolute path",
            ));
        }
        if self.temperature_low_c >= self.temperature_high_c
            || self.humidity_low_pct >= self.humidity_high_pct
        {
            return Err(ConfigError::ValidationFailed(
                "warning bands must satisfy low < high",
            ));
        }
        Ok(())
    }

    /// Sleep duration for the given mode (milliseconds).
    pub fn sleep_duration_ms(&self, mode: SleepMode) -> u32 {
        match mode {
            SleepMode::Short => self.sleep_short_ms,
            SleepMode::Deep => self.sleep_deep_ms,
        }
    }
}
