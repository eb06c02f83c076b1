//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every field sensor and produces one [`SensorSample`] per
//! cycle.  Every read is an explicit `Result`; a failed channel fails the
//! whole sample so the cycle can be skipped instead of classifying on a
//! partial reading.
//!
//! The soil sensor, microphone pre-amp and SHT31 share one switched supply
//! rail.  [`SensorPort::suspend`] cuts it before sleep and
//! [`SensorPort::resume`] restores it; an unpowered hub refuses to read.

pub mod audio;
pub mod battery;
pub mod sht31;
pub mod soil;
pub mod stats;

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;
use log::{debug, warn};
use serde::Serialize;

use crate::app::ports::SensorPort;
use crate::error::SensorError;
use audio::{AudioEnergyMeter, AudioSource};
use sht31::Sht31;
use soil::SoilMoistureSensor;

/// Plausible temperature band of the climate sensor (°C).
pub const TEMPERATURE_RANGE_C: (f32, f32) = (-40.0, 85.0);

/// One reading of every field sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorSample {
    /// Volumetric soil moisture (0-100 %).
    pub soil_moisture: f32,
    /// Air temperature (°C).
    pub temperature: f32,
    /// Relative humidity (0-100 %).
    pub humidity: f32,
    /// Normalised acoustic energy (0-1).
    pub audio_energy: f32,
    /// Monotonic milliseconds since boot.
    pub timestamp: u64,
}

/// Check a sample against physical plausibility bounds.
pub fn validate(sample: &SensorSample) -> Result<(), SensorError> {
    let in_range = |v: f32, lo: f32, hi: f32| v.is_finite() && (lo..=hi).contains(&v);

    if in_range(sample.soil_moisture, 0.0, 100.0)
        && in_range(sample.humidity, 0.0, 100.0)
        && in_range(sample.audio_energy, 0.0, 1.0)
        && in_range(sample.temperature, TEMPERATURE_RANGE_C.0, TEMPERATURE_RANGE_C.1)
    {
        Ok(())
    } else {
        Err(SensorError::OutOfRange)
    }
}

/// A single ADC-backed input returning millivolts.
pub trait AnalogChannel {
    fn read_millivolts(&mut self) -> Result<u16, SensorError>;
}

/// Aggregates the field sensors and produces a unified sample.
pub struct SensorHub<I, S, A, P> {
    climate: Sht31<I>,
    soil: SoilMoistureSensor<S>,
    audio: AudioEnergyMeter<A>,
    supply: P,
    powered: bool,
}

impl<I, S, A, P> SensorHub<I, S, A, P>
where
    I: I2c,
    S: AnalogChannel,
    A: AudioSource,
    P: OutputPin,
{
    /// Construct a hub from pre-built drivers (built in main where
    /// peripheral ownership is established).  `supply` is the sensor rail
    /// enable; it is switched on here.
    pub fn new(
        climate: Sht31<I>,
        soil: SoilMoistureSensor<S>,
        audio: AudioEnergyMeter<A>,
        supply: P,
    ) -> Self {
        let mut hub = Self {
            climate,
            soil,
            audio,
            supply,
            powered: false,
        };
        hub.set_powered(true);
        hub
    }

    /// Read every sensor and stamp the sample with `timestamp`.
    pub fn read_sample(&mut self, timestamp: u64) -> Result<SensorSample, SensorError> {
        if !self.powered {
            return Err(SensorError::Timeout);
        }
        let soil_moisture = self.soil.read_percent()?;
        let climate = self.climate.measure()?;
        let audio_energy = self.audio.measure()?;

        Ok(SensorSample {
            soil_moisture,
            temperature: climate.temperature_c,
            humidity: climate.humidity_pct,
            audio_energy,
            timestamp,
        })
    }

    pub fn soil_mut(&mut self) -> &mut SoilMoistureSensor<S> {
        &mut self.soil
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    /// The rail is considered off only once the pin write succeeded.
    fn set_powered(&mut self, on: bool) {
        let r = if on {
            self.supply.set_high()
        } else {
            self.supply.set_low()
        };
        if r.is_ok() {
            self.powered = on;
            debug!("sensors: supply {}", if on { "on" } else { "off" });
        } else {
            warn!("sensors: supply enable write failed");
        }
    }
}

impl<I, S, A, P> SensorPort for SensorHub<I, S, A, P>
where
    I: I2c,
    S: AnalogChannel,
    A: AudioSource,
    P: OutputPin,
{
    fn read(&mut self, timestamp: u64) -> Result<SensorSample, SensorError> {
        self.read_sample(timestamp)
    }

    fn suspend(&mut self) {
        self.set_powered(false);
    }

    fn resume(&mut self) {
        self.set_powered(true);
    }
}
