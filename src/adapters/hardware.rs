//! Hardware adapter: bridges the field peripherals to the domain ports.
//!
//! Bundles the sensor hub, battery monitor, status LEDs, clock and sleep
//! timer so the [`PowerScheduler`](crate::scheduler::PowerScheduler) can take
//! a single `hw` handle.  Each port call is forwarded to the component that
//! owns it; nothing here holds state of its own.

use crate::app::ports::{
    BatteryPort, ClockPort, SensorPort, StatusIndication, StatusPort, TimerPort,
};
use crate::config::SleepMode;
use crate::error::SensorError;
use crate::sensors::SensorSample;

pub struct FieldHardware<S, B, L, C, T> {
    sensors: S,
    battery: B,
    status: L,
    clock: C,
    timer: T,
}

impl<S, B, L, C, T> FieldHardware<S, B, L, C, T>
where
    S: SensorPort,
    B: BatteryPort,
    L: StatusPort,
    C: ClockPort,
    T: TimerPort,
{
    pub fn new(sensors: S, battery: B, status: L, clock: C, timer: T) -> Self {
        Self {
            sensors,
            battery,
            status,
            clock,
            timer,
        }
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        &mut self.sensors
    }

    pub fn status(&self) -> &L {
        &self.status
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }
}

// ── SensorPort ────────────────────────────────────────────────

impl<S: SensorPort, B, L, C, T> SensorPort for FieldHardware<S, B, L, C, T> {
    fn read(&mut self, timestamp: u64) -> Result<SensorSample, SensorError> {
        self.sensors.read(timestamp)
    }

    fn suspend(&mut self) {
        self.sensors.suspend();
    }

    fn resume(&mut self) {
        self.sensors.resume();
    }
}

// ── BatteryPort ───────────────────────────────────────────────

impl<S, B: BatteryPort, L, C, T> BatteryPort for FieldHardware<S, B, L, C, T> {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        self.battery.read_voltage()
    }
}

// ── StatusPort ────────────────────────────────────────────────

impl<S, B, L: StatusPort, C, T> StatusPort for FieldHardware<S, B, L, C, T> {
    fn show(&mut self, status: StatusIndication) {
        self.status.show(status);
    }
}

// ── ClockPort / TimerPort ─────────────────────────────────────

impl<S, B, L, C: ClockPort, T> ClockPort for FieldHardware<S, B, L, C, T> {
    fn now_us(&self) -> u64 {
        self.clock.now_us()
    }
}

impl<S, B, L, C, T: TimerPort> TimerPort for FieldHardware<S, B, L, C, T> {
    fn sleep(&mut self, duration_ms: u32, mode: SleepMode) {
        self.timer.sleep(duration_ms, mode);
    }
}
