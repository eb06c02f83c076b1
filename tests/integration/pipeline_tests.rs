//! AppService pipeline: sensor read → features → classifier → decision →
//! dispatch, against the mock board and transport.

use cropwatch::alert::AlertKind;
use cropwatch::alert::dispatcher::{DispatchOutcome, RateLimiterState};
use cropwatch::app::events::AppEvent;
use cropwatch::app::ports::StatusIndication;
use cropwatch::app::service::{AppService, CycleContext, CycleOutcome};
use cropwatch::config::{OutOfRangePolicy, SystemConfig};
use cropwatch::error::{Error, InferenceError, SensorError, TransportError};
use cropwatch::ml::classifier::ClassLabel;
use cropwatch::ml::engine::DenseInt8Engine;
use cropwatch::sensors::SensorSample;

use crate::mock_hw::{
    BoardCall, MockBoard, MockTransport, RecordingSink, ScriptedEngine, calm_sample, dry_sample,
    pest_sample,
};

const DEVICE: &str = "KR-1A2B3C";

fn started(config: SystemConfig) -> (AppService<DenseInt8Engine>, RateLimiterState, RecordingSink) {
    let limiter = RateLimiterState::new(u64::from(config.min_alert_interval_ms));
    let mut service = AppService::new(config, DenseInt8Engine::new(), DEVICE);
    let mut sink = RecordingSink::new();
    service.start(&mut sink).expect("reference engine must start");
    (service, limiter, sink)
}

fn ctx(cycle: u32, now_ms: u64) -> CycleContext {
    CycleContext { cycle, now_ms }
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn start_reports_model_info() {
    let (_service, _limiter, sink) = started(SystemConfig::default());
    let info = sink
        .events
        .iter()
        .find_map(|e| match e {
            AppEvent::Started { info, .. } => Some(*info),
            _ => None,
        })
        .expect("Started event");
    assert_eq!(info.input_bytes, 4);
    assert_eq!(info.output_bytes, 3);
    assert!(info.quantized);
    assert!(info.arena_used <= info.arena_size);
}

#[test]
fn schema_mismatch_halts_before_first_cycle() {
    let mut engine = ScriptedEngine::new([0.1, 0.1, 0.8]);
    engine.model_version += 1;
    let mut service = AppService::new(SystemConfig::default(), engine, DEVICE);
    let mut sink = RecordingSink::new();

    let err = service.start(&mut sink).unwrap_err();
    assert_eq!(err, Error::Inference(InferenceError::SchemaMismatch));
    assert!(err.is_fatal());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Halted(_))), 1);

    // A halted classifier refuses to run.
    let mut limiter = RateLimiterState::new(300_000);
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::new();
    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(
        report.outcome,
        CycleOutcome::InferenceFailed(InferenceError::NotInitialized)
    );
    assert!(transport.posts.is_empty());
}

#[test]
fn undersized_arena_is_fatal() {
    let mut engine = ScriptedEngine::new([0.1, 0.1, 0.8]);
    engine.arena_required = 1 << 20;
    let mut service = AppService::new(SystemConfig::default(), engine, DEVICE);
    let err = service.start(&mut RecordingSink::new()).unwrap_err();
    assert_eq!(err, Error::Inference(InferenceError::AllocationFailed));
}

// ── Classification and decision ───────────────────────────────

#[test]
fn pest_field_raises_and_delivers_alert() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(
        ctx(0, 90_000),
        &mut limiter,
        &mut hw,
        &mut transport,
        &mut sink,
    );

    let CycleOutcome::Classified(result) = report.outcome else {
        panic!("expected classification, got {:?}", report.outcome);
    };
    assert_eq!(result.predicted_class, ClassLabel::PestRisk);
    assert!(result.confidence > 0.70);

    let intent = report.intent.expect("intent");
    assert_eq!(intent.kind, AlertKind::PestRisk);
    assert_eq!(intent.created_at, 90_000);
    assert_eq!(intent.sensor_snapshot.map(|s| s.timestamp), Some(90_000));
    assert!(matches!(
        report.dispatch,
        Some(DispatchOutcome::Sent { kind: AlertKind::PestRisk, status: 200 })
    ));

    assert_eq!(limiter.last_sent_at(), Some(90_000));
    assert_eq!(hw.statuses(), vec![StatusIndication::Alert]);
    assert_eq!(transport.posts.len(), 1);
    assert_eq!(transport.posts[0].path, "/api/v1/alerts");
    assert_eq!(transport.posts[0].content_type, "application/json");

    let body = transport.last_json();
    assert_eq!(body["device_id"], DEVICE);
    assert_eq!(body["alert_type"], "pest_risk");
    assert_eq!(body["timestamp"], 90_000);
    assert!(body["sensor_data"]["moisture"].is_number());
    assert_eq!(service.metrics().alerts_sent, 1);
}

#[test]
fn dry_field_is_water_stress() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(dry_sample());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 1_000), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(report.intent.map(|i| i.kind), Some(AlertKind::WaterStress));
    assert_eq!(transport.last_json()["alert_type"], "water_stress");
    assert_eq!(
        transport.last_json()["recommendation"],
        "Initiate irrigation in affected area"
    );
}

#[test]
fn calm_field_shows_green_and_sends_nothing() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(calm_sample());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 1_000), &mut limiter, &mut hw, &mut transport, &mut sink);
    let CycleOutcome::Classified(result) = report.outcome else {
        panic!("expected classification");
    };
    assert_eq!(result.predicted_class, ClassLabel::Normal);
    assert!(report.intent.is_none());
    assert!(report.dispatch.is_none());
    assert_eq!(hw.statuses(), vec![StatusIndication::Normal]);
    assert_eq!(transport.connect_attempts, 0);
    assert_eq!(limiter.last_sent_at(), None);
}

#[test]
fn score_below_configured_threshold_does_not_alert() {
    let mut config = SystemConfig::default();
    config.confidence_threshold = 0.90;
    let limiter_ms = u64::from(config.min_alert_interval_ms);
    let mut service = AppService::new(config, ScriptedEngine::new([0.05, 0.10, 0.85]), DEVICE);
    let mut sink = RecordingSink::new();
    service.start(&mut sink).unwrap();
    let mut limiter = RateLimiterState::new(limiter_ms);
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert!(matches!(report.outcome, CycleOutcome::Classified(_)));
    assert!(report.intent.is_none());
    // Neither green nor red for an unconfident result.
    assert!(hw.statuses().is_empty());
}

#[test]
fn unconfident_normal_leaves_leds_unchanged() {
    let mut service = AppService::new(
        SystemConfig::default(),
        ScriptedEngine::new([0.50, 0.30, 0.20]),
        DEVICE,
    );
    let mut sink = RecordingSink::new();
    service.start(&mut sink).unwrap();
    let mut limiter = RateLimiterState::new(300_000);
    let mut hw = MockBoard::new(calm_sample());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    let CycleOutcome::Classified(result) = report.outcome else {
        panic!("expected classification");
    };
    assert_eq!(result.predicted_class, ClassLabel::Normal);
    assert!(hw.statuses().is_empty());
}

// ── Faults and validation ─────────────────────────────────────

#[test]
fn sensor_fault_skips_the_cycle() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample()).then(Err(SensorError::I2c));
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(report.outcome, CycleOutcome::SensorFault(SensorError::I2c));
    assert!(report.intent.is_none());
    assert_eq!(service.classifier().engine().invocations(), 0);
    assert_eq!(service.metrics().cycles_skipped, 1);
    assert!(hw.statuses().is_empty());

    // Next cycle reads fine again.
    let report = service.run_cycle(
        ctx(1, 30_000),
        &mut limiter,
        &mut hw,
        &mut transport,
        &mut sink,
    );
    assert!(matches!(report.outcome, CycleOutcome::Classified(_)));
}

fn implausible() -> SensorSample {
    SensorSample {
        humidity: 130.0,
        ..pest_sample()
    }
}

#[test]
fn out_of_range_sample_is_skipped_by_default() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(implausible());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(report.outcome, CycleOutcome::OutOfRange);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SampleOutOfRange { skipped: true })),
        1
    );
    assert_eq!(service.metrics().out_of_range_samples, 1);
    assert_eq!(service.classifier().engine().invocations(), 0);
}

#[test]
fn out_of_range_sample_can_be_classified() {
    let mut config = SystemConfig::default();
    config.out_of_range_policy = OutOfRangePolicy::Proceed;
    let (mut service, mut limiter, mut sink) = started(config);
    let mut hw = MockBoard::new(implausible());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert!(matches!(report.outcome, CycleOutcome::Classified(_)));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::SampleOutOfRange { skipped: false })),
        1
    );
    // Warnings are only evaluated for valid samples.
    assert_eq!(service.conditions().warnings(), 0);
}

#[test]
fn invoke_failure_is_contained_in_the_cycle() {
    let mut engine = ScriptedEngine::new([0.05, 0.10, 0.85]);
    engine.fail_invoke = true;
    let mut service = AppService::new(SystemConfig::default(), engine, DEVICE);
    let mut sink = RecordingSink::new();
    service.start(&mut sink).unwrap();
    let mut limiter = RateLimiterState::new(300_000);
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(
        report.outcome,
        CycleOutcome::InferenceFailed(InferenceError::InvokeFailed)
    );
    assert!(transport.posts.is_empty());
    assert_eq!(service.metrics().inference_failures, 1);
}

#[test]
fn slow_inference_is_flagged_not_dropped() {
    let mut config = SystemConfig::default();
    config.inference_budget_us = 100;
    let (mut service, mut limiter, mut sink) = started(config);
    let mut hw = MockBoard::new(pest_sample());
    hw.tick_us = 500;
    let mut transport = MockTransport::new();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    let CycleOutcome::Classified(result) = report.outcome else {
        panic!("expected classification");
    };
    assert!(result.over_budget);
    assert!(report.intent.is_some());
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::InferenceOverBudget { budget_us: 100, .. })),
        1
    );
}

#[test]
fn hot_valid_sample_raises_condition_warning() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(dry_sample());
    let mut transport = MockTransport::new();

    service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_ne!(service.conditions().warnings(), 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WarningsChanged(_))), 1);

    // Unchanged warnings are not re-reported.
    service.run_cycle(ctx(1, 30_000), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::WarningsChanged(_))), 1);
}

// ── Rate limiting and retries ─────────────────────────────────

#[test]
fn second_alert_within_interval_is_rate_limited() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::new();

    service.run_cycle(ctx(0, 10_000), &mut limiter, &mut hw, &mut transport, &mut sink);
    let report = service.run_cycle(
        ctx(1, 70_000),
        &mut limiter,
        &mut hw,
        &mut transport,
        &mut sink,
    );
    assert_eq!(
        report.dispatch,
        Some(DispatchOutcome::RateLimited {
            kind: AlertKind::PestRisk,
            remaining_ms: 240_000,
        })
    );
    assert_eq!(transport.posts.len(), 1);
    assert_eq!(limiter.last_sent_at(), Some(10_000));
    // Rate-limited intents are never held for retry.
    assert_eq!(service.dispatcher().held(), None);

    let report = service.run_cycle(
        ctx(2, 310_000),
        &mut limiter,
        &mut hw,
        &mut transport,
        &mut sink,
    );
    assert!(report.dispatch.is_some_and(|d| d.is_sent()));
    assert_eq!(limiter.last_sent_at(), Some(310_000));
    assert_eq!(service.metrics().alerts_rate_limited, 1);
}

#[test]
fn rate_limit_is_global_across_kinds() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::new();

    service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    hw.set_sample(dry_sample());
    let report = service.run_cycle(
        ctx(1, 30_000),
        &mut limiter,
        &mut hw,
        &mut transport,
        &mut sink,
    );
    assert!(matches!(
        report.dispatch,
        Some(DispatchOutcome::RateLimited { kind: AlertKind::WaterStress, .. })
    ));
}

#[test]
fn failed_alert_is_retried_on_a_later_quiet_cycle() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::answering(&[503]);

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(
        report.dispatch,
        Some(DispatchOutcome::Failed {
            kind: AlertKind::PestRisk,
            error: TransportError::NonSuccessStatus(503),
            attempts: 1,
            retry_scheduled: true,
        })
    );
    assert_eq!(limiter.last_sent_at(), None);
    assert_eq!(service.dispatcher().held(), Some((AlertKind::PestRisk, 1)));

    // Too early: the retry interval has not elapsed.
    hw.set_sample(calm_sample());
    let report = service.run_cycle(ctx(1, 1_000), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert!(report.dispatch.is_none());

    let report = service.run_cycle(ctx(2, 6_000), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(
        report.dispatch,
        Some(DispatchOutcome::Sent { kind: AlertKind::PestRisk, status: 200 })
    );
    assert_eq!(transport.posts.len(), 2);
    assert_eq!(limiter.last_sent_at(), Some(6_000));
    assert_eq!(service.dispatcher().held(), None);
    // The retried payload still carries the original timestamp.
    assert_eq!(transport.last_json()["timestamp"], 0);
}

#[test]
fn retries_stop_after_max_attempts() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::offline();

    let report = service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert!(matches!(
        report.dispatch,
        Some(DispatchOutcome::Failed { error: TransportError::ConnectTimeout, attempts: 1, .. })
    ));

    hw.set_sample(calm_sample());
    let mut last = None;
    for cycle in 1..=5u32 {
        let now = u64::from(cycle) * 30_000;
        last = service
            .run_cycle(ctx(cycle, now), &mut limiter, &mut hw, &mut transport, &mut sink)
            .dispatch
            .or(last);
    }

    // One initial attempt plus three retries.
    assert_eq!(transport.connect_attempts, 4);
    assert_eq!(
        last,
        Some(DispatchOutcome::Failed {
            kind: AlertKind::PestRisk,
            error: TransportError::ConnectTimeout,
            attempts: 4,
            retry_scheduled: false,
        })
    );
    assert_eq!(service.dispatcher().held(), None);
    assert_eq!(service.metrics().alerts_failed, 4);
}

#[test]
fn newer_intent_supersedes_held_alert() {
    let (mut service, mut limiter, mut sink) = started(SystemConfig::default());
    let mut hw = MockBoard::new(pest_sample());
    let mut transport = MockTransport::answering(&[500]);

    service.run_cycle(ctx(0, 0), &mut limiter, &mut hw, &mut transport, &mut sink);
    assert_eq!(service.dispatcher().held(), Some((AlertKind::PestRisk, 1)));

    hw.set_sample(dry_sample());
    let report = service.run_cycle(
        ctx(1, 30_000),
        &mut limiter,
        &mut hw,
        &mut transport,
        &mut sink,
    );
    assert_eq!(
        report.dispatch,
        Some(DispatchOutcome::Sent { kind: AlertKind::WaterStress, status: 200 })
    );
    assert_eq!(service.dispatcher().held(), None);
    assert_eq!(hw.count(BoardCall::Read), 2);
}
