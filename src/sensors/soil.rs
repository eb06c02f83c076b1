//! Capacitive soil-moisture sensor on an ADC channel.
//!
//! The sensor output falls as the soil gets wetter.  A two-point calibration
//! (dry air reading, saturated soil reading) maps millivolts onto a
//! volumetric percentage, clamped to `[0, 100]`.

use super::AnalogChannel;
use crate::error::SensorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibration {
    /// Reading in dry air (mV).
    pub dry_mv: u16,
    /// Reading in saturated soil (mV).
    pub wet_mv: u16,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            dry_mv: 2800,
            wet_mv: 1200,
        }
    }
}

pub struct SoilMoistureSensor<S> {
    channel: S,
    cal: Calibration,
}

impl<S: AnalogChannel> SoilMoistureSensor<S> {
    pub fn new(channel: S) -> Self {
        Self {
            channel,
            cal: Calibration::default(),
        }
    }

    /// Replace the calibration points.  A degenerate pair (dry == wet) is
    /// refused and the previous calibration kept.
    pub fn calibrate(&mut self, dry_mv: u16, wet_mv: u16) -> Result<(), SensorError> {
        if dry_mv == wet_mv {
            return Err(SensorError::Calibration);
        }
        self.cal = Calibration { dry_mv, wet_mv };
        log::info!("soil: calibrated dry={dry_mv} mV wet={wet_mv} mV");
        Ok(())
    }

    pub fn calibration(&self) -> Calibration {
        self.cal
    }

    pub fn read_percent(&mut self) -> Result<f32, SensorError> {
        let mv = self.channel.read_millivolts()?;
        Ok(millivolts_to_percent(mv, self.cal))
    }
}

fn millivolts_to_percent(mv: u16, cal: Calibration) -> f32 {
    let dry = f32::from(cal.dry_mv);
    let wet = f32::from(cal.wet_mv);
    let pct = (dry - f32::from(mv)) / (dry - wet) * 100.0;
    pct.clamp(0.0, 100.0)
}
