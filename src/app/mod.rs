//! Application core: the sensor-to-alert pipeline, zero I/O.
//!
//! [`service::AppService`] runs one pipeline pass per cycle.  All
//! interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
