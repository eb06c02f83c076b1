//! PowerScheduler duty cycle: ACTIVE/SLEEPING alternation, battery checks
//! every N cycles, LOW_BATTERY routing and critical-battery deep sleep.

use cropwatch::alert::dispatcher::DispatchOutcome;
use cropwatch::app::events::AppEvent;
use cropwatch::app::ports::StatusIndication;
use cropwatch::app::service::{AppService, CycleOutcome};
use cropwatch::config::{SleepMode, SystemConfig};
use cropwatch::error::SensorError;
use cropwatch::ml::engine::DenseInt8Engine;
use cropwatch::power::{BatteryLevel, PowerState};
use cropwatch::scheduler::PowerScheduler;

use crate::mock_hw::{BoardCall, MockBoard, MockTransport, RecordingSink, calm_sample, pest_sample};

struct Rig {
    scheduler: PowerScheduler,
    service: AppService<DenseInt8Engine>,
    hw: MockBoard,
    transport: MockTransport,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: SystemConfig, hw: MockBoard) -> Self {
        let scheduler = PowerScheduler::new(&config);
        let mut service = AppService::new(config, DenseInt8Engine::new(), "KR-000001");
        let mut sink = RecordingSink::new();
        service.start(&mut sink).unwrap();
        Self {
            scheduler,
            service,
            hw,
            transport: MockTransport::new(),
            sink,
        }
    }

    fn step(&mut self) -> cropwatch::scheduler::StepReport {
        self.scheduler.step(
            &mut self.service,
            &mut self.hw,
            &mut self.transport,
            &mut self.sink,
        )
    }
}

fn config_checking_every(n: u32) -> SystemConfig {
    let mut config = SystemConfig::default();
    config.battery_check_every_cycles = n;
    config
}

#[test]
fn phases_alternate_strictly() {
    let mut rig = Rig::new(SystemConfig::default(), MockBoard::new(calm_sample()));
    for _ in 0..5 {
        rig.step();
    }

    let transitions: Vec<(PowerState, PowerState)> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::PowerStateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();

    // First step starts ACTIVE: sleep only.  Every later step wakes first.
    assert_eq!(transitions[0], (PowerState::Active, PowerState::Sleeping));
    for pair in transitions.windows(2) {
        assert_ne!(pair[0].1, pair[1].1, "two consecutive {:?} phases", pair[0].1);
        assert_eq!(pair[0].1, pair[1].0);
    }
    assert_eq!(transitions.len(), 9);
    assert_eq!(rig.scheduler.state(), PowerState::Sleeping);
    assert_eq!(rig.scheduler.cycle_count(), 5);
    assert_eq!(rig.hw.sleeps().len(), 5);
}

#[test]
fn nothing_runs_while_sleeping() {
    let mut rig = Rig::new(SystemConfig::default(), MockBoard::new(pest_sample()));
    for _ in 0..4 {
        rig.step();
    }
    assert_eq!(rig.hw.reads_while_suspended, 0);

    // Per cycle: read … show(Off), suspend, sleep, then resume on the next.
    let calls = &rig.hw.calls;
    for (i, call) in calls.iter().enumerate() {
        if let BoardCall::Sleep(..) = call {
            assert_eq!(calls[i - 1], BoardCall::Suspend);
            assert_eq!(calls[i - 2], BoardCall::Show(StatusIndication::Off));
            if let Some(next) = calls.get(i + 1) {
                assert_eq!(*next, BoardCall::Resume);
            }
        }
    }
}

#[test]
fn cycle_timestamps_follow_the_sleep_timer() {
    let mut rig = Rig::new(SystemConfig::default(), MockBoard::new(calm_sample()));
    let first = rig.step();
    let second = rig.step();

    let started: Vec<u64> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::CycleStarted { now_ms, .. } => Some(*now_ms),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec![1_000, 31_000]);
    assert_eq!((first.cycle, second.cycle), (0, 1));
    assert_eq!(first.sleep_ms, 30_000);
    assert_eq!(first.sleep_mode, SleepMode::Short);
}

#[test]
fn battery_is_checked_every_n_cycles() {
    let mut rig = Rig::new(config_checking_every(3), MockBoard::new(calm_sample()));
    let checked: Vec<bool> = (0..7).map(|_| rig.step().battery.is_some()).collect();

    assert_eq!(checked, vec![true, false, false, true, false, false, true]);
    assert_eq!(rig.hw.count(BoardCall::Battery), 3);
    assert_eq!(rig.service.metrics().battery_checks, 3);
    // Performance summary rides along with every battery check.
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Performance { .. })), 3);
}

#[test]
fn low_battery_raises_alert_without_snapshot() {
    let hw = MockBoard::new(calm_sample()).with_voltage(3.4);
    let mut rig = Rig::new(SystemConfig::default(), hw);

    let report = rig.step();
    let battery = report.battery.expect("battery checked on cycle 0");
    assert_eq!(battery.level, BatteryLevel::Low);
    assert_eq!(report.sleep_mode, SleepMode::Short);

    assert_eq!(rig.transport.posts.len(), 1);
    let body = rig.transport.last_json();
    assert_eq!(body["alert_type"], "low_battery");
    assert_eq!(body["confidence"], 0);
    assert!(body.get("sensor_data").is_none());
    assert_eq!(body["recommendation"], "Check solar panel and charging system");
}

#[test]
fn low_battery_shares_the_rate_limiter() {
    let hw = MockBoard::new(pest_sample()).with_voltage(3.4);
    let mut rig = Rig::new(SystemConfig::default(), hw);
    rig.step();

    // Pest alert went out first; the battery alert in the same cycle is limited.
    assert_eq!(rig.transport.posts.len(), 1);
    assert_eq!(rig.transport.last_json()["alert_type"], "pest_risk");
    let limited = rig.sink.count(|e| {
        matches!(
            e,
            AppEvent::AlertDispatched(DispatchOutcome::RateLimited { .. })
        )
    });
    assert_eq!(limited, 1);
}

#[test]
fn critical_battery_forces_deep_sleep() {
    let hw = MockBoard::new(calm_sample()).with_voltage(3.2);
    let mut rig = Rig::new(config_checking_every(2), hw);

    let report = rig.step();
    assert_eq!(report.battery.map(|b| b.level), Some(BatteryLevel::Critical));
    assert_eq!(report.sleep_mode, SleepMode::Deep);
    assert_eq!(report.sleep_ms, 300_000);
    assert_eq!(rig.scheduler.battery_level(), BatteryLevel::Critical);

    // Level sticks until the next check.
    let report = rig.step();
    assert!(report.battery.is_none());
    assert_eq!(report.sleep_mode, SleepMode::Deep);

    rig.hw.voltage = Ok(3.9);
    let report = rig.step();
    assert_eq!(report.battery.map(|b| b.level), Some(BatteryLevel::Normal));
    assert_eq!(report.sleep_mode, SleepMode::Short);
    assert_eq!(
        rig.hw.sleeps(),
        vec![
            (300_000, SleepMode::Deep),
            (300_000, SleepMode::Deep),
            (30_000, SleepMode::Short),
        ]
    );
}

#[test]
fn unreadable_battery_keeps_last_level() {
    let mut hw = MockBoard::new(calm_sample());
    hw.voltage = Err(SensorError::Adc);
    let mut rig = Rig::new(SystemConfig::default(), hw);

    let report = rig.step();
    assert!(report.battery.is_none());
    assert_eq!(rig.scheduler.battery_level(), BatteryLevel::Normal);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::BatteryFault(SensorError::Adc))),
        1
    );
}

#[test]
fn sensor_fault_still_sleeps() {
    let hw = MockBoard::new(calm_sample()).then(Err(SensorError::Timeout));
    let mut rig = Rig::new(SystemConfig::default(), hw);

    let report = rig.step();
    assert_eq!(report.cycle_report.outcome, CycleOutcome::SensorFault(SensorError::Timeout));
    assert_eq!(rig.scheduler.state(), PowerState::Sleeping);
    assert_eq!(rig.hw.sleeps().len(), 1);
    assert_eq!(rig.hw.statuses(), vec![StatusIndication::Off]);
}
