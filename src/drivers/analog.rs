//! ADC-backed inputs for the sensor drivers.
//!
//! [`AdcChannel`] feeds the soil sensor and the battery divider through the
//! [`AnalogChannel`] trait; [`AdcMicrophone`] fills PCM frames for the
//! audio-energy meter from the microphone pre-amp.

use crate::drivers::hw_init::{adc1_read, raw_to_millivolts};
use crate::error::SensorError;
use crate::pins;
use crate::sensors::AnalogChannel;
use crate::sensors::audio::AudioSource;

/// Mid-rail bias of the microphone pre-amp (raw counts).
pub const MIC_BIAS_RAW: i32 = 2048;

#[derive(Debug, Clone, Copy)]
pub struct AdcChannel {
    channel: u32,
}

impl AdcChannel {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub fn soil() -> Self {
        Self::new(pins::SOIL_ADC_CHANNEL)
    }

    pub fn battery() -> Self {
        Self::new(pins::BATTERY_ADC_CHANNEL)
    }
}

impl AnalogChannel for AdcChannel {
    fn read_millivolts(&mut self) -> Result<u16, SensorError> {
        adc1_read(self.channel).map(raw_to_millivolts)
    }
}

/// Microphone sampled through ADC1 oneshot conversions.
///
/// Samples are taken back to back, so the effective rate is whatever the
/// oneshot driver sustains; energy is rate-independent.
#[derive(Debug, Clone, Copy)]
pub struct AdcMicrophone {
    channel: u32,
}

impl AdcMicrophone {
    pub fn new() -> Self {
        Self {
            channel: pins::MIC_ADC_CHANNEL,
        }
    }
}

impl Default for AdcMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

/// Centre a 12-bit conversion on the bias and widen it to 16-bit PCM.
pub fn raw_to_pcm(raw: u16) -> i16 {
    let centred = (i32::from(raw) - MIC_BIAS_RAW) << 4;
    centred.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

impl AudioSource for AdcMicrophone {
    fn capture(&mut self, frame: &mut [i16]) -> Result<usize, SensorError> {
        for slot in frame.iter_mut() {
            *slot = raw_to_pcm(adc1_read(self.channel)?);
        }
        Ok(frame.len())
    }
}
