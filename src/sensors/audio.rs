//! Acoustic energy meter for insect activity.
//!
//! Captures one PCM frame (256 samples, 16 ms at 16 kHz) and reports its
//! RMS amplitude normalised to full scale, so silence is `0.0` and a
//! full-scale square wave is `1.0`.

use crate::error::SensorError;

pub const AUDIO_SAMPLE_RATE_HZ: u32 = 16_000;
pub const AUDIO_FRAME_LEN: usize = 256;

/// Source of signed 16-bit PCM samples.
pub trait AudioSource {
    /// Fill `frame` and return how many samples were written.
    fn capture(&mut self, frame: &mut [i16]) -> Result<usize, SensorError>;
}

pub struct AudioEnergyMeter<A> {
    source: A,
    frame: [i16; AUDIO_FRAME_LEN],
}

impl<A: AudioSource> AudioEnergyMeter<A> {
    pub fn new(source: A) -> Self {
        Self {
            source,
            frame: [0; AUDIO_FRAME_LEN],
        }
    }

    /// Normalised RMS energy of one frame.  An empty capture is a timeout.
    pub fn measure(&mut self) -> Result<f32, SensorError> {
        let n = self.source.capture(&mut self.frame)?.min(AUDIO_FRAME_LEN);
        if n == 0 {
            return Err(SensorError::Timeout);
        }
        Ok(rms_energy(&self.frame[..n]))
    }
}

/// RMS of `samples` relative to i16 full scale, in `[0, 1]`.
pub fn rms_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let x = f64::from(s) / 32768.0;
            x * x
        })
        .sum();
    ((sum_sq / samples.len() as f64).sqrt() as f32).clamp(0.0, 1.0)
}
