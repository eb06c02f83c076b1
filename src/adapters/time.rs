//! Monotonic clock adapter.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()` (microsecond
//!   precision, monotonic, keeps counting through light sleep).
//! - **`not(target_os = "espidf")`** uses `std::time::Instant` plus the time
//!   the simulated [`SleepTimer`](super::sleep::SleepTimer) has skipped, so a
//!   host run sees the same timeline as the device without actually waiting.

use crate::app::ports::ClockPort;

/// System clock for the field node.
pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot.
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: read-only access to the high-resolution timer counter.
        let now = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        u64::try_from(now).unwrap_or(0)
    }

    /// Microseconds since this clock was created, plus simulated sleep.
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        let real = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        real.saturating_add(super::sleep::sim_slept_ms().saturating_mul(1000))
    }
}

impl ClockPort for SystemClock {
    fn now_us(&self) -> u64 {
        self.uptime_us()
    }
}
