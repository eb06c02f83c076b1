//! Environmental condition monitor.
//!
//! Runs on every valid sample and keeps a latched warning bitmask.  A bit
//! is set while its condition holds and cleared as soon as it does not;
//! transitions are logged once.  Warnings are informational: they are
//! reported as events and never become alert intents.

use core::fmt;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::sensors::SensorSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EnvironmentWarning {
    HighTemperature = 0,
    LowTemperature = 1,
    HighHumidity = 2,
    LowHumidity = 3,
    LowSoilMoisture = 4,
}

impl EnvironmentWarning {
    pub const ALL: [Self; 5] = [
        Self::HighTemperature,
        Self::LowTemperature,
        Self::HighHumidity,
        Self::LowHumidity,
        Self::LowSoilMoisture,
    ];

    pub fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for EnvironmentWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighTemperature => write!(f, "high temperature"),
            Self::LowTemperature => write!(f, "low temperature"),
            Self::HighHumidity => write!(f, "high humidity"),
            Self::LowHumidity => write!(f, "low humidity"),
            Self::LowSoilMoisture => write!(f, "low soil moisture"),
        }
    }
}

pub struct ConditionMonitor {
    temperature_high_c: f32,
    temperature_low_c: f32,
    humidity_high_pct: f32,
    humidity_low_pct: f32,
    soil_moisture_low_pct: f32,
    /// Latched warning bitmask.
    warnings: u8,
}

impl ConditionMonitor {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            temperature_high_c: config.temperature_high_c,
            temperature_low_c: config.temperature_low_c,
            humidity_high_pct: config.humidity_high_pct,
            humidity_low_pct: config.humidity_low_pct,
            soil_moisture_low_pct: config.soil_moisture_low_pct,
            warnings: 0,
        }
    }

    /// Re-evaluate every condition and return the updated bitmask.
    pub fn evaluate(&mut self, sample: &SensorSample) -> u8 {
        self.eval(
            EnvironmentWarning::HighTemperature,
            sample.temperature > self.temperature_high_c,
        );
        self.eval(
            EnvironmentWarning::LowTemperature,
            sample.temperature < self.temperature_low_c,
        );
        self.eval(
            EnvironmentWarning::HighHumidity,
            sample.humidity > self.humidity_high_pct,
        );
        self.eval(
            EnvironmentWarning::LowHumidity,
            sample.humidity < self.humidity_low_pct,
        );
        self.eval(
            EnvironmentWarning::LowSoilMoisture,
            sample.soil_moisture < self.soil_moisture_low_pct,
        );
        self.warnings
    }

    pub fn warnings(&self) -> u8 {
        self.warnings
    }

    pub fn has_warning(&self, warning: EnvironmentWarning) -> bool {
        self.warnings & warning.mask() != 0
    }

    /// Active warnings in bit order.
    pub fn active(&self) -> impl Iterator<Item = EnvironmentWarning> + '_ {
        EnvironmentWarning::ALL
            .into_iter()
            .filter(|w| self.has_warning(*w))
    }

    fn eval(&mut self, warning: EnvironmentWarning, condition: bool) {
        if condition {
            if self.warnings & warning.mask() == 0 {
                warn!("CONDITION SET: {warning}");
            }
            self.warnings |= warning.mask();
        } else {
            if self.warnings & warning.mask() != 0 {
                info!("CONDITION CLEARED: {warning}");
            }
            self.warnings &= !warning.mask();
        }
    }
}
