//! Unified error types for the CropWatch firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! scheduler loop's error handling uniform.  All variants are `Copy` so they
//! can be carried inside events and reports without allocation.
//!
//! Per-cycle errors (sensor, inference invoke, transport) are contained in
//! the cycle that produced them.  Only the fatal ones reported by
//! [`Error::is_fatal`] stop the device from reaching its first cycle.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// The classifier could not be initialised or invoked.
    Inference(InferenceError),
    /// The alert could not be delivered.
    Transport(TransportError),
    /// Configuration is invalid or could not be parsed.
    Config(ConfigError),
}

impl Error {
    /// Errors that must halt the firmware before the first cycle.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Inference(e) => e.is_fatal(),
            Self::Config(_) => true,
            Self::Sensor(_) | Self::Transport(_) => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Inference(e) => write!(f, "inference: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// ADC conversion failed.
    Adc,
    /// I2C transaction failed or returned a corrupt frame.
    I2c,
    /// The sensor did not answer within its hardware timeout.
    Timeout,
    /// Calibration data is missing or degenerate.
    Calibration,
    /// Reading is outside the physically plausible range.
    OutOfRange,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adc => write!(f, "ADC read failed"),
            Self::I2c => write!(f, "I2C transaction failed"),
            Self::Timeout => write!(f, "sensor timeout"),
            Self::Calibration => write!(f, "calibration invalid"),
            Self::OutOfRange => write!(f, "reading out of range"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Inference errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferenceError {
    /// `infer` was called before a successful `initialize`, or after a
    /// fatal initialisation failure.
    NotInitialized,
    /// Engine interface version disagrees with the compiled model.
    SchemaMismatch,
    /// The scratch arena is too small for the model.
    AllocationFailed,
    /// The engine reported a failure while running the model.
    InvokeFailed,
}

impl InferenceError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SchemaMismatch | Self::AllocationFailed)
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "classifier not initialised"),
            Self::SchemaMismatch => write!(f, "model schema mismatch"),
            Self::AllocationFailed => write!(f, "tensor arena allocation failed"),
            Self::InvokeFailed => write!(f, "engine invoke failed"),
        }
    }
}

impl From<InferenceError> for Error {
    fn from(e: InferenceError) -> Self {
        Self::Inference(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    NotConnected,
    ConnectTimeout,
    SendTimeout,
    /// Server answered with a status outside 2xx.
    NonSuccessStatus(u16),
    /// The payload could not be serialised.
    PayloadEncoding,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::ConnectTimeout => write!(f, "connect timed out"),
            Self::SendTimeout => write!(f, "send timed out"),
            Self::NonSuccessStatus(code) => write!(f, "HTTP status {code}"),
            Self::PayloadEncoding => write!(f, "payload encoding failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration blob could not be parsed.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed configuration"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
