//! Sensor sample → normalised feature vector.
//!
//! | index | feature        | mapping                 |
//! |-------|----------------|-------------------------|
//! | 0     | soil moisture  | `moisture / 100`        |
//! | 1     | temperature    | `(temperature - 10) / 40` |
//! | 2     | humidity       | `humidity / 100`        |
//! | 3     | audio energy   | pass-through            |
//!
//! Values outside `[0, 1]` are kept as-is; the quantizer saturates them.

use crate::config::MAX_SMOOTHING_WINDOW;
use crate::sensors::SensorSample;
use crate::sensors::stats::StatsBuffer;

pub const FEATURE_COUNT: usize = 4;

pub type FeatureVector = [f32; FEATURE_COUNT];

const WINDOW_CAP: usize = MAX_SMOOTHING_WINDOW as usize;

/// Pure mapping of one sample.
pub fn extract(sample: &SensorSample) -> FeatureVector {
    [
        sample.soil_moisture / 100.0,
        (sample.temperature - 10.0) / 40.0,
        sample.humidity / 100.0,
        sample.audio_energy,
    ]
}

/// Feature extraction with an optional per-channel moving mean.
///
/// With `window == 1` this is exactly [`extract`].  Larger windows keep the
/// last `window` feature values per channel, popping the oldest before
/// every push once the window is full.
pub struct FeatureExtractor {
    window: usize,
    channels: [StatsBuffer<WINDOW_CAP>; FEATURE_COUNT],
}

impl FeatureExtractor {
    pub fn new(window: u8) -> Self {
        Self {
            window: usize::from(window).clamp(1, WINDOW_CAP),
            channels: Default::default(),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn extract(&mut self, sample: &SensorSample) -> FeatureVector {
        let raw = extract(sample);
        if self.window == 1 {
            return raw;
        }

        let mut out = [0.0; FEATURE_COUNT];
        for ((buf, value), slot) in self.channels.iter_mut().zip(raw).zip(out.iter_mut()) {
            if buf.len() >= self.window {
                buf.pop();
            }
            buf.push(value);
            *slot = buf.mean();
        }
        out
    }

    /// Forget the smoothing history.
    pub fn reset(&mut self) {
        self.channels.iter_mut().for_each(StatsBuffer::clear);
    }
}
