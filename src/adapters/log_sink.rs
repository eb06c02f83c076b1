//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in the field).  Every record is one
//! line with a fixed prefix so a serial capture can be grepped by concern.

use log::{error, info, warn};

use crate::alert::dispatcher::DispatchOutcome;
use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { model_version, info: m } => {
                info!(
                    "START | model v{} | in={}B out={}B | arena {}/{}B | quantized={}",
                    model_version, m.input_bytes, m.output_bytes, m.arena_used, m.arena_size,
                    m.quantized,
                );
            }
            AppEvent::Halted(e) => {
                error!("START | halted: {}", e);
            }
            AppEvent::CycleStarted { cycle, now_ms } => {
                info!("CYCLE | #{} at {}ms", cycle, now_ms);
            }
            AppEvent::Sample(s) => {
                info!(
                    "CYCLE | soil={:.1}% T={:.1}\u{00b0}C RH={:.1}% audio={:.3}",
                    s.soil_moisture, s.temperature, s.humidity, s.audio_energy,
                );
            }
            AppEvent::SensorFault(e) => {
                warn!("CYCLE | sensor fault ({}), cycle skipped", e);
            }
            AppEvent::SampleOutOfRange { skipped } => {
                if *skipped {
                    warn!("CYCLE | sample out of range, cycle skipped");
                } else {
                    warn!("CYCLE | sample out of range, classifying flagged sample");
                }
            }
            AppEvent::WarningsChanged(mask) => {
                info!("WARN  | conditions=0b{:08b}", mask);
            }
            AppEvent::Classified(r) => {
                info!(
                    "INFER | {} ({:.2}) | scores=[{:.2}, {:.2}, {:.2}] | {}us",
                    r.predicted_class.name(),
                    r.confidence,
                    r.raw_scores[0],
                    r.raw_scores[1],
                    r.raw_scores[2],
                    r.inference_time_us,
                );
            }
            AppEvent::InferenceFailed(e) => {
                warn!("INFER | failed: {}", e);
            }
            AppEvent::InferenceOverBudget { elapsed_us, budget_us } => {
                warn!("INFER | over budget: {}us > {}us", elapsed_us, budget_us);
            }
            AppEvent::AlertRaised(intent) => {
                info!(
                    "ALERT | raised {} ({}%){}",
                    intent.kind.as_str(),
                    intent.confidence_pct,
                    if intent.sensor_snapshot.is_some() { "" } else { " [no snapshot]" },
                );
            }
            AppEvent::AlertDispatched(outcome) => match outcome {
                DispatchOutcome::Sent { kind, status } => {
                    info!("ALERT | sent {} (HTTP {})", kind.as_str(), status);
                }
                DispatchOutcome::RateLimited { kind, remaining_ms } => {
                    info!("ALERT | {} rate limited, {}ms left", kind.as_str(), remaining_ms);
                }
                DispatchOutcome::Failed { kind, error: e, attempts, retry_scheduled } => {
                    warn!(
                        "ALERT | {} failed after {} attempt(s): {}{}",
                        kind.as_str(),
                        attempts,
                        e,
                        if *retry_scheduled { ", retry held" } else { ", dropped" },
                    );
                }
            },
            AppEvent::BatteryChecked(b) => {
                info!("BATT  | {:.2}V ({}%) {:?}", b.voltage, b.percentage, b.level);
            }
            AppEvent::BatteryFault(e) => {
                warn!("BATT  | read failed: {}", e);
            }
            AppEvent::PowerStateChanged { from, to } => {
                info!("POWER | {:?} -> {:?}", from, to);
            }
            AppEvent::Sleeping { duration_ms, mode } => {
                info!("POWER | sleeping {}ms ({:?})", duration_ms, mode);
            }
            AppEvent::Performance { inference: p, metrics: m } => {
                info!(
                    "PERF  | n={} mean={:.0}us sd={:.0}us min={:.0}us max={:.0}us budget={}us ok={}",
                    p.samples, p.mean_us, p.stddev_us, p.min_us, p.max_us, p.budget_us,
                    p.meets_budget,
                );
                info!(
                    "PERF  | cycles={} skipped={} alerts sent={} limited={} failed={} heap={}B",
                    m.cycles, m.cycles_skipped, m.alerts_sent, m.alerts_rate_limited,
                    m.alerts_failed, m.heap_free,
                );
            }
        }
    }
}
