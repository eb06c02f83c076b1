//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the
//! [`PowerScheduler`](crate::scheduler::PowerScheduler) emit these through
//! the [`EventSink`](super::ports::EventSink) port.

use crate::alert::AlertIntent;
use crate::alert::dispatcher::DispatchOutcome;
use crate::config::SleepMode;
use crate::diagnostics::{InferenceReport, RuntimeMetrics};
use crate::error::{Error, InferenceError, SensorError};
use crate::ml::classifier::{ClassificationResult, ModelInfo};
use crate::power::{BatteryStatus, PowerState};
use crate::sensors::SensorSample;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Classifier initialised; the pipeline is ready.
    Started {
        model_version: u32,
        info: ModelInfo,
    },

    /// A fatal initialisation error; no cycle will run.
    Halted(Error),

    /// A pipeline pass began.
    CycleStarted { cycle: u32, now_ms: u64 },

    /// A sample was read.
    Sample(SensorSample),

    /// Sensor read failed; the cycle was skipped.
    SensorFault(SensorError),

    /// The sample failed plausibility checks.
    SampleOutOfRange { skipped: bool },

    /// Environmental warning bitmask changed.
    WarningsChanged(u8),

    Classified(ClassificationResult),

    InferenceFailed(InferenceError),

    InferenceOverBudget { elapsed_us: u32, budget_us: u32 },

    /// The decision policy or battery check produced an intent.
    AlertRaised(AlertIntent),

    AlertDispatched(DispatchOutcome),

    BatteryChecked(BatteryStatus),

    /// Battery could not be read.
    BatteryFault(SensorError),

    PowerStateChanged { from: PowerState, to: PowerState },

    /// About to suspend.
    Sleeping { duration_ms: u32, mode: SleepMode },

    /// Periodic performance summary.
    Performance {
        inference: InferenceReport,
        metrics: RuntimeMetrics,
    },
}
