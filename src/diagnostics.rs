//! Runtime diagnostics.
//!
//! [`InferenceStats`] keeps the most recent 100 inference durations and
//! summarises them against the configured budget.  [`RuntimeMetrics`]
//! counts what happened across cycles.  Both serialize with serde for a
//! periodic report line.

use serde::Serialize;

use crate::sensors::stats::StatsBuffer;

/// Inference durations kept for statistics.
pub const PERFORMANCE_SAMPLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InferenceReport {
    pub samples: usize,
    pub total_inferences: u32,
    pub mean_us: f32,
    pub stddev_us: f32,
    pub min_us: f32,
    pub max_us: f32,
    pub budget_us: u32,
    pub over_budget: u32,
    pub meets_budget: bool,
}

pub struct InferenceStats {
    durations: StatsBuffer<PERFORMANCE_SAMPLES>,
    budget_us: u32,
    total: u32,
    over_budget: u32,
}

impl InferenceStats {
    pub fn new(budget_us: u32) -> Self {
        Self {
            durations: StatsBuffer::new(),
            budget_us,
            total: 0,
            over_budget: 0,
        }
    }

    /// Record one inference; the oldest duration is dropped once the
    /// window is full.
    pub fn record(&mut self, elapsed_us: u32) {
        if self.durations.is_full() {
            self.durations.pop();
        }
        self.durations.push(elapsed_us as f32);
        self.total = self.total.saturating_add(1);
        if elapsed_us > self.budget_us {
            self.over_budget = self.over_budget.saturating_add(1);
        }
    }

    pub fn report(&self) -> InferenceReport {
        let mean_us = self.durations.mean();
        InferenceReport {
            samples: self.durations.len(),
            total_inferences: self.total,
            mean_us,
            stddev_us: self.durations.stddev(),
            min_us: self.durations.min().unwrap_or(0.0),
            max_us: self.durations.max().unwrap_or(0.0),
            budget_us: self.budget_us,
            over_budget: self.over_budget,
            meets_budget: mean_us <= self.budget_us as f32,
        }
    }
}

/// Cross-cycle counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RuntimeMetrics {
    pub cycles: u32,
    pub cycles_skipped: u32,
    pub out_of_range_samples: u32,
    pub inference_failures: u32,
    pub over_budget_inferences: u32,
    pub alerts_sent: u32,
    pub alerts_rate_limited: u32,
    pub alerts_failed: u32,
    pub battery_checks: u32,
    pub heap_free: u32,
}

impl RuntimeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the sampled (non-counter) fields.
    pub fn sample_heap(&mut self) {
        self.heap_free = free_heap_bytes();
    }
}

#[cfg(target_os = "espidf")]
fn free_heap_bytes() -> u32 {
    // SAFETY: read-only query of the IDF heap allocator.
    unsafe { esp_idf_svc::sys::esp_get_free_heap_size() }
}

#[cfg(not(target_os = "espidf"))]
fn free_heap_bytes() -> u32 {
    // Typical free heap on the target after init.
    256 * 1024
}
