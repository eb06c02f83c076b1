//! Sleep timer adapter: the scheduler's only suspension point.
//!
//! On the device both modes use timer-wakeup light sleep: RAM (and with it
//! the rate limiter, cycle counter and held retry) survives, and
//! [`SleepMode::Deep`] simply means the longer configured duration.  ESP
//! deep sleep would reboot the core and lose that state.
//!
//! On the host the timer does not block.  It adds the requested duration
//! to a simulated offset that [`SystemClock`](super::time::SystemClock)
//! folds into its readings, so simulated runs keep a realistic timeline.

use log::debug;

use crate::app::ports::TimerPort;
use crate::config::SleepMode;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(target_os = "espidf"))]
static SIM_SLEPT_MS: AtomicU64 = AtomicU64::new(0);

/// Total milliseconds skipped by simulated sleeps.
#[cfg(not(target_os = "espidf"))]
pub fn sim_slept_ms() -> u64 {
    SIM_SLEPT_MS.load(Ordering::Relaxed)
}

/// Timer-wakeup sleep.
#[derive(Debug, Default)]
pub struct SleepTimer {
    sleeps: u32,
}

impl SleepTimer {
    pub fn new() -> Self {
        Self { sleeps: 0 }
    }

    /// Number of completed sleeps.
    pub fn sleeps(&self) -> u32 {
        self.sleeps
    }

    #[cfg(target_os = "espidf")]
    fn platform_sleep(&mut self, duration_ms: u32) {
        use esp_idf_svc::sys::{ESP_OK, esp_light_sleep_start, esp_sleep_enable_timer_wakeup};

        let us = u64::from(duration_ms) * 1000;
        // SAFETY: single main-task caller; the wakeup source is re-armed on
        // every call and light sleep returns with RAM intact.
        let armed = unsafe { esp_sleep_enable_timer_wakeup(us) };
        if armed != ESP_OK as i32 {
            log::warn!("sleep: timer wakeup rejected (rc={}), delaying instead", armed);
            esp_idf_hal::delay::FreeRtos::delay_ms(duration_ms);
            return;
        }
        // SAFETY: see above.
        let rc = unsafe { esp_light_sleep_start() };
        if rc != ESP_OK as i32 {
            log::warn!("sleep: light sleep refused (rc={}), delaying", rc);
            esp_idf_hal::delay::FreeRtos::delay_ms(duration_ms);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_sleep(&mut self, duration_ms: u32) {
        SIM_SLEPT_MS.fetch_add(u64::from(duration_ms), Ordering::Relaxed);
    }
}

impl TimerPort for SleepTimer {
    fn sleep(&mut self, duration_ms: u32, mode: SleepMode) {
        debug!("sleep: {}ms ({:?})", duration_ms, mode);
        self.platform_sleep(duration_ms);
        self.sleeps = self.sleeps.wrapping_add(1);
    }
}
