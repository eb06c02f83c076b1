//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService / PowerScheduler (domain)
//! ```
//!
//! Driven adapters (sensors, status LEDs, transport, clock, sleep timer,
//! event sinks) implement these traits.  The domain consumes them via
//! generics, so it never touches hardware directly.

use crate::config::SleepMode;
use crate::error::{SensorError, TransportError};
use crate::sensors::SensorSample;

// ───────────────────────────────────────────────────────────────
// Sensor ports (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one unified sample per cycle.
pub trait SensorPort {
    /// Read every field sensor and stamp the sample with `timestamp` (ms).
    fn read(&mut self, timestamp: u64) -> Result<SensorSample, SensorError>;

    /// Put the sensors into their low-power state before sleeping.
    fn suspend(&mut self) {}

    /// Wake the sensors after sleeping.
    fn resume(&mut self) {}
}

/// Battery voltage, read only when a battery check is due.
pub trait BatteryPort {
    fn read_voltage(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Status indication (driven adapter: domain → LEDs)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndication {
    /// Confident NORMAL classification (green).
    Normal,
    /// An alert intent was raised this cycle (red).
    Alert,
    /// Everything dark (before sleep).
    Off,
}

pub trait StatusPort {
    fn show(&mut self, status: StatusIndication);
}

// ───────────────────────────────────────────────────────────────
// Alert transport (driven adapter: domain → network)
// ───────────────────────────────────────────────────────────────

/// "Send bytes, get a status code" capability used by the dispatcher.
pub trait AlertTransport {
    fn is_connected(&self) -> bool;

    /// Bring the link up, giving up after `timeout_ms`.
    fn connect(&mut self, timeout_ms: u32) -> bool;

    /// POST `body` to `path`; returns the HTTP status code.
    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<u16, TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Time (driven adapter: monotonic clock, sleep timer)
// ───────────────────────────────────────────────────────────────

/// Monotonic time since boot.
pub trait ClockPort {
    fn now_us(&self) -> u64;

    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}

/// The only suspension point: "wake me after `duration_ms`".
pub trait TimerPort {
    fn sleep(&mut self, duration_ms: u32, mode: SleepMode);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
