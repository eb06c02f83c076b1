//! Li-ion battery voltage through a resistive divider.

use super::AnalogChannel;
use crate::app::ports::BatteryPort;
use crate::error::SensorError;

/// Cell voltage treated as empty / full when reporting a percentage.
pub const CELL_EMPTY_V: f32 = 3.0;
pub const CELL_FULL_V: f32 = 4.2;

pub struct BatteryMonitor<S> {
    channel: S,
    /// V_battery / V_adc.
    divider_ratio: f32,
}

impl<S: AnalogChannel> BatteryMonitor<S> {
    /// `divider_ratio` is (R_top + R_bottom) / R_bottom, 2.0 for a 1:1 divider.
    pub fn new(channel: S, divider_ratio: f32) -> Self {
        Self {
            channel,
            divider_ratio,
        }
    }

    pub fn voltage(&mut self) -> Result<f32, SensorError> {
        let mv = self.channel.read_millivolts()?;
        let v = f32::from(mv) / 1000.0 * self.divider_ratio;
        if !v.is_finite() || v <= 0.0 {
            return Err(SensorError::OutOfRange);
        }
        Ok(v)
    }
}

impl<S: AnalogChannel> BatteryPort for BatteryMonitor<S> {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        self.voltage()
    }
}

/// Linear state-of-charge estimate, clamped to `0..=100`.
pub fn voltage_to_percentage(voltage: f32, min_voltage: f32, max_voltage: f32) -> u8 {
    if max_voltage <= min_voltage || voltage.is_nan() {
        return 0;
    }
    let pct = (voltage - min_voltage) / (max_voltage - min_voltage) * 100.0;
    pct.clamp(0.0, 100.0).round() as u8
}
