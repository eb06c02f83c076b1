//! CropWatch field node firmware library.
//!
//! Exposes the sensor-to-alert pipeline for the device binary, host
//! simulation and integration tests.  All ESP-IDF-specific code is guarded
//! by `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

#[cfg(all(target_os = "espidf", not(feature = "espidf")))]
compile_error!("device builds need `--features espidf` (the ESP-IDF crates are optional)");

pub mod alert;
pub mod app;
pub mod conditions;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ml;
pub mod pins;
pub mod power;
pub mod scheduler;

pub mod adapters;
pub mod drivers;
pub mod sensors;
