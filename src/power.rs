//! Power state and battery classification.
//!
//! | Voltage                       | Level      | Effect                        |
//! |-------------------------------|------------|-------------------------------|
//! | `v <= battery_critical_v`     | `Critical` | LOW_BATTERY alert, deep sleep |
//! | `v <  battery_low_v`          | `Low`      | LOW_BATTERY alert             |
//! | otherwise                     | `Normal`   | none                          |

use serde::Serialize;

use crate::config::{SleepMode, SystemConfig};
use crate::sensors::battery::{CELL_EMPTY_V, CELL_FULL_V, voltage_to_percentage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PowerState {
    Active,
    Sleeping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatteryLevel {
    Normal,
    Low,
    Critical,
}

impl BatteryLevel {
    /// `critical_v` is inclusive, `low_v` exclusive.
    pub fn classify(voltage: f32, low_v: f32, critical_v: f32) -> Self {
        if voltage <= critical_v {
            Self::Critical
        } else if voltage < low_v {
            Self::Low
        } else {
            Self::Normal
        }
    }

    /// Whether this level raises a LOW_BATTERY alert.
    pub fn needs_alert(self) -> bool {
        self != Self::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatteryStatus {
    pub voltage: f32,
    pub percentage: u8,
    pub level: BatteryLevel,
}

impl BatteryStatus {
    pub fn assess(voltage: f32, config: &SystemConfig) -> Self {
        Self {
            voltage,
            percentage: voltage_to_percentage(voltage, CELL_EMPTY_V, CELL_FULL_V),
            level: BatteryLevel::classify(
                voltage,
                config.battery_low_v,
                config.battery_critical_v,
            ),
        }
    }
}

/// Critical battery overrides the configured mode with deep sleep.
pub fn select_sleep_mode(configured: SleepMode, battery: BatteryLevel) -> SleepMode {
    match battery {
        BatteryLevel::Critical => SleepMode::Deep,
        BatteryLevel::Low | BatteryLevel::Normal => configured,
    }
}
