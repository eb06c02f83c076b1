//! Application service: the hexagonal core.
//!
//! [`AppService`] owns every pipeline stage and runs one pass per cycle:
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────────────┐ ──▶ EventSink
//!                 │              AppService              │
//!                 │ validate · features · classify ·     │
//!  StatusPort ◀── │ decide · dispatch                    │ ──▶ AlertTransport
//!                 └──────────────────────────────────────┘
//! ```
//!
//! Per-cycle errors end the pass early and are reported; they never
//! escape `run_cycle`.  The rate limiter is owned by the scheduler and
//! lent to the dispatcher for the duration of a call.

use log::{info, warn};

use crate::alert::AlertIntent;
use crate::alert::dispatcher::{AlertDispatcher, DispatchOutcome, RateLimiterState};
use crate::conditions::ConditionMonitor;
use crate::config::{OutOfRangePolicy, SystemConfig};
use crate::diagnostics::{InferenceStats, RuntimeMetrics};
use crate::error::{Error, InferenceError, SensorError};
use crate::ml::classifier::{ClassLabel, ClassificationResult, ClassifierAdapter, ModelSchema};
use crate::ml::decision::DecisionPolicy;
use crate::ml::engine::InferenceEngine;
use crate::ml::features::FeatureExtractor;
use crate::power::BatteryStatus;
use crate::sensors;

use super::events::AppEvent;
use super::ports::{
    AlertTransport, BatteryPort, ClockPort, EventSink, SensorPort, StatusIndication, StatusPort,
};

/// Explicit per-cycle context threaded through every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleContext {
    pub cycle: u32,
    /// Cycle timestamp (ms since boot); stamps the sample and any alert.
    pub now_ms: u64,
}

/// How a pipeline pass ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    Classified(ClassificationResult),
    SensorFault(SensorError),
    OutOfRange,
    InferenceFailed(InferenceError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub intent: Option<AlertIntent>,
    /// Result of a fresh dispatch or of a retry of a held alert.
    pub dispatch: Option<DispatchOutcome>,
}

impl CycleReport {
    fn ended(outcome: CycleOutcome) -> Self {
        Self {
            outcome,
            intent: None,
            dispatch: None,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService<E> {
    config: SystemConfig,
    features: FeatureExtractor,
    classifier: ClassifierAdapter<E>,
    policy: DecisionPolicy,
    dispatcher: AlertDispatcher,
    conditions: ConditionMonitor,
    inference_stats: InferenceStats,
    metrics: RuntimeMetrics,
}

impl<E: InferenceEngine> AppService<E> {
    /// Construct the service.  Call [`start`](Self::start) before the
    /// first cycle.
    pub fn new(config: SystemConfig, engine: E, device_id: &str) -> Self {
        Self {
            features: FeatureExtractor::new(config.smoothing_window),
            classifier: ClassifierAdapter::new(
                engine,
                config.tensor_arena_bytes,
                config.inference_budget_us,
            ),
            policy: DecisionPolicy::new(config.confidence_threshold),
            dispatcher: AlertDispatcher::new(&config, device_id),
            conditions: ConditionMonitor::new(&config),
            inference_stats: InferenceStats::new(config.inference_budget_us),
            metrics: RuntimeMetrics::new(),
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Initialise the classifier.  An error here is fatal: the caller
    /// must not enter the cycle loop.
    pub fn start(&mut self, sink: &mut impl EventSink) -> Result<ModelSchema, Error> {
        match self.classifier.initialize() {
            Ok(schema) => {
                if let Some(info) = self.classifier.model_info() {
                    sink.emit(&AppEvent::Started {
                        model_version: schema.model_version,
                        info,
                    });
                }
                info!(
                    "AppService started, device {}, threshold {:.2}",
                    self.dispatcher.device_id(),
                    self.policy.threshold()
                );
                Ok(schema)
            }
            Err(e) => {
                let err = Error::from(e);
                sink.emit(&AppEvent::Halted(err));
                Err(err)
            }
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// One pipeline pass: read → validate → extract → classify → decide →
    /// dispatch.  A cycle without a new intent retries a held alert.
    ///
    /// `hw` satisfies the sensor, status and clock ports at once, which
    /// avoids juggling several mutable borrows of the same board.
    pub fn run_cycle<H, T, S>(
        &mut self,
        ctx: CycleContext,
        limiter: &mut RateLimiterState,
        hw: &mut H,
        transport: &mut T,
        sink: &mut S,
    ) -> CycleReport
    where
        H: SensorPort + StatusPort + ClockPort,
        T: AlertTransport,
        S: EventSink,
    {
        self.metrics.cycles = self.metrics.cycles.saturating_add(1);
        sink.emit(&AppEvent::CycleStarted {
            cycle: ctx.cycle,
            now_ms: ctx.now_ms,
        });

        // 1. Read sensors
        let sample = match hw.read(ctx.now_ms) {
            Ok(s) => s,
            Err(e) => {
                warn!("cycle {}: sensor fault: {e}, skipping", ctx.cycle);
                self.metrics.cycles_skipped = self.metrics.cycles_skipped.saturating_add(1);
                sink.emit(&AppEvent::SensorFault(e));
                return CycleReport::ended(CycleOutcome::SensorFault(e));
            }
        };
        sink.emit(&AppEvent::Sample(sample));

        // 2. Plausibility
        if sensors::validate(&sample).is_err() {
            self.metrics.out_of_range_samples = self.metrics.out_of_range_samples.saturating_add(1);
            let skipped = self.config.out_of_range_policy == OutOfRangePolicy::Skip;
            sink.emit(&AppEvent::SampleOutOfRange { skipped });
            if skipped {
                self.metrics.cycles_skipped = self.metrics.cycles_skipped.saturating_add(1);
                return CycleReport::ended(CycleOutcome::OutOfRange);
            }
            warn!("cycle {}: classifying implausible sample", ctx.cycle);
        } else {
            // 3. Environmental warnings (valid samples only)
            let before = self.conditions.warnings();
            let after = self.conditions.evaluate(&sample);
            if before != after {
                sink.emit(&AppEvent::WarningsChanged(after));
            }
        }

        // 4. Features + classification
        let features = self.features.extract(&sample);
        let result = match self.classifier.classify(&features, &*hw) {
            Ok(r) => r,
            Err(e) => {
                self.metrics.inference_failures = self.metrics.inference_failures.saturating_add(1);
                sink.emit(&AppEvent::InferenceFailed(e));
                return CycleReport::ended(CycleOutcome::InferenceFailed(e));
            }
        };
        self.inference_stats.record(result.inference_time_us);
        if result.over_budget {
            self.metrics.over_budget_inferences =
                self.metrics.over_budget_inferences.saturating_add(1);
            sink.emit(&AppEvent::InferenceOverBudget {
                elapsed_us: result.inference_time_us,
                budget_us: self.config.inference_budget_us,
            });
        }
        sink.emit(&AppEvent::Classified(result));

        // 5. Decision
        let intent = self.policy.evaluate(&result, &sample, ctx.now_ms);

        // 6. Dispatch (or retry a held alert)
        let dispatch = match intent {
            Some(intent) => {
                hw.show(StatusIndication::Alert);
                sink.emit(&AppEvent::AlertRaised(intent));
                Some(self.dispatcher.dispatch(intent, ctx.now_ms, limiter, transport))
            }
            None => {
                // Low-confidence cycles leave the LEDs as they are.
                if result.predicted_class == ClassLabel::Normal
                    && result.confidence > self.policy.threshold()
                {
                    hw.show(StatusIndication::Normal);
                }
                self.dispatcher.retry_pending(ctx.now_ms, limiter, transport)
            }
        };
        if let Some(outcome) = dispatch {
            self.record_dispatch(outcome, sink);
        }

        CycleReport {
            outcome: CycleOutcome::Classified(result),
            intent,
            dispatch,
        }
    }

    /// Read the battery and, when low, route a LOW_BATTERY intent through
    /// the same dispatcher.
    pub fn check_battery<B, T, S>(
        &mut self,
        ctx: CycleContext,
        limiter: &mut RateLimiterState,
        battery: &mut B,
        transport: &mut T,
        sink: &mut S,
    ) -> Option<BatteryStatus>
    where
        B: BatteryPort + ?Sized,
        T: AlertTransport,
        S: EventSink,
    {
        self.metrics.battery_checks = self.metrics.battery_checks.saturating_add(1);
        let voltage = match battery.read_voltage() {
            Ok(v) => v,
            Err(e) => {
                warn!("battery: read failed: {e}");
                sink.emit(&AppEvent::BatteryFault(e));
                return None;
            }
        };

        let status = BatteryStatus::assess(voltage, &self.config);
        sink.emit(&AppEvent::BatteryChecked(status));

        if status.level.needs_alert() {
            let intent = AlertIntent::low_battery(ctx.now_ms);
            sink.emit(&AppEvent::AlertRaised(intent));
            let outcome = self.dispatcher.dispatch(intent, ctx.now_ms, limiter, transport);
            self.record_dispatch(outcome, sink);
        }
        Some(status)
    }

    /// Emit the periodic performance summary.
    pub fn report(&mut self, sink: &mut impl EventSink) {
        self.metrics.sample_heap();
        sink.emit(&AppEvent::Performance {
            inference: self.inference_stats.report(),
            metrics: self.metrics.clone(),
        });
    }

    fn record_dispatch(&mut self, outcome: DispatchOutcome, sink: &mut impl EventSink) {
        let counter = match outcome {
            DispatchOutcome::Sent { .. } => &mut self.metrics.alerts_sent,
            DispatchOutcome::RateLimited { .. } => &mut self.metrics.alerts_rate_limited,
            DispatchOutcome::Failed { .. } => &mut self.metrics.alerts_failed,
        };
        *counter = counter.saturating_add(1);
        sink.emit(&AppEvent::AlertDispatched(outcome));
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn metrics(&self) -> &RuntimeMetrics {
        &self.metrics
    }

    pub fn classifier(&self) -> &ClassifierAdapter<E> {
        &self.classifier
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn conditions(&self) -> &ConditionMonitor {
        &self.conditions
    }
}
