//! Battery-aware duty-cycle scheduler.
//!
//! ```text
//!        ┌──────────────── step() ────────────────┐
//!        │                                        │
//!   ──▶ ACTIVE ── pipeline pass ── battery check ──▶ SLEEPING ── timer ──┐
//!        ▲        (every cycle)    (every N cycles)                     │
//!        └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler owns the cross-cycle state: the cycle counter, the
//! [`RateLimiterState`] it lends to the dispatcher, the current
//! [`PowerState`] and the last battery level.  Sleep is the only
//! suspension point; nothing runs while the timer is pending.

use log::info;

use crate::alert::dispatcher::RateLimiterState;
use crate::app::events::AppEvent;
use crate::app::ports::{
    AlertTransport, BatteryPort, ClockPort, EventSink, SensorPort, StatusIndication, StatusPort,
    TimerPort,
};
use crate::app::service::{AppService, CycleContext, CycleReport};
use crate::config::{SleepMode, SystemConfig};
use crate::ml::engine::InferenceEngine;
use crate::power::{BatteryLevel, BatteryStatus, PowerState, select_sleep_mode};

/// What one duty cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub cycle: u32,
    pub cycle_report: CycleReport,
    /// `Some` when a battery check ran and the voltage was readable.
    pub battery: Option<BatteryStatus>,
    pub sleep_mode: SleepMode,
    pub sleep_ms: u32,
}

pub struct PowerScheduler {
    state: PowerState,
    cycle: u32,
    limiter: RateLimiterState,
    battery_level: BatteryLevel,
    sleep_mode: SleepMode,
    sleep_short_ms: u32,
    sleep_deep_ms: u32,
    battery_check_every: u32,
}

impl PowerScheduler {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            state: PowerState::Active,
            cycle: 0,
            limiter: RateLimiterState::new(u64::from(config.min_alert_interval_ms)),
            battery_level: BatteryLevel::Normal,
            sleep_mode: config.sleep_mode,
            sleep_short_ms: config.sleep_short_ms,
            sleep_deep_ms: config.sleep_deep_ms,
            battery_check_every: config.battery_check_every_cycles.max(1),
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// Completed duty cycles.
    pub fn cycle_count(&self) -> u32 {
        self.cycle
    }

    pub fn rate_limiter(&self) -> &RateLimiterState {
        &self.limiter
    }

    pub fn battery_level(&self) -> BatteryLevel {
        self.battery_level
    }

    /// Battery is checked on cycle 0 and every N cycles after.
    pub fn battery_check_due(&self) -> bool {
        self.cycle % self.battery_check_every == 0
    }

    /// Run one ACTIVE phase followed by one SLEEPING phase.
    pub fn step<E, H, T, S>(
        &mut self,
        service: &mut AppService<E>,
        hw: &mut H,
        transport: &mut T,
        sink: &mut S,
    ) -> StepReport
    where
        E: InferenceEngine,
        H: SensorPort + BatteryPort + StatusPort + ClockPort + TimerPort,
        T: AlertTransport,
        S: EventSink,
    {
        // ── ACTIVE ────────────────────────────────────────────
        if self.state == PowerState::Sleeping {
            hw.resume();
            self.transition(PowerState::Active, sink);
        }

        let ctx = CycleContext {
            cycle: self.cycle,
            now_ms: hw.now_ms(),
        };
        let cycle_report = service.run_cycle(ctx, &mut self.limiter, hw, transport, sink);

        let battery = if self.battery_check_due() {
            let status = service.check_battery(ctx, &mut self.limiter, hw, transport, sink);
            if let Some(s) = status {
                if s.level != self.battery_level {
                    info!("battery level {:?} -> {:?}", self.battery_level, s.level);
                }
                self.battery_level = s.level;
            }
            service.report(sink);
            status
        } else {
            None
        };

        // ── SLEEPING ──────────────────────────────────────────
        let sleep_mode = select_sleep_mode(self.sleep_mode, self.battery_level);
        let sleep_ms = match sleep_mode {
            SleepMode::Short => self.sleep_short_ms,
            SleepMode::Deep => self.sleep_deep_ms,
        };

        hw.show(StatusIndication::Off);
        hw.suspend();
        self.transition(PowerState::Sleeping, sink);
        sink.emit(&AppEvent::Sleeping {
            duration_ms: sleep_ms,
            mode: sleep_mode,
        });
        hw.sleep(sleep_ms, sleep_mode);

        let cycle = self.cycle;
        self.cycle = self.cycle.wrapping_add(1);

        StepReport {
            cycle,
            cycle_report,
            battery,
            sleep_mode,
            sleep_ms,
        }
    }

    fn transition(&mut self, to: PowerState, sink: &mut impl EventSink) {
        let from = self.state;
        self.state = to;
        sink.emit(&AppEvent::PowerStateChanged { from, to });
    }
}
