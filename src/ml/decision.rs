//! Confidence-gated alert decision.
//!
//! The winning class must score strictly above the threshold, and
//! `Normal` never alerts.  Ties go to the lowest class index.

use crate::alert::{AlertIntent, AlertKind};
use crate::sensors::SensorSample;

use super::classifier::{CLASS_COUNT, ClassLabel, ClassificationResult};

/// Index of the highest score; the first one wins a tie.  NaN never wins
/// over a number.
pub fn argmax(scores: &[f32]) -> usize {
    let mut best = 0;
    for (i, &s) in scores.iter().enumerate().skip(1) {
        if s > scores[best] || (scores[best].is_nan() && !s.is_nan()) {
            best = i;
        }
    }
    best
}

pub fn decide(raw_scores: &[f32; CLASS_COUNT], threshold: f32) -> Option<AlertKind> {
    let winner = argmax(raw_scores);
    let score = raw_scores[winner];
    if score.is_nan() || score <= threshold {
        return None;
    }
    match ClassLabel::from_index(winner) {
        ClassLabel::WaterStress => Some(AlertKind::WaterStress),
        ClassLabel::PestRisk => Some(AlertKind::PestRisk),
        ClassLabel::Normal | ClassLabel::Unknown => None,
    }
}

/// [`decide`] bound to a configured threshold, producing full intents.
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    threshold: f32,
}

impl DecisionPolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn evaluate(
        &self,
        result: &ClassificationResult,
        sample: &SensorSample,
        now_ms: u64,
    ) -> Option<AlertIntent> {
        let kind = decide(&result.raw_scores, self.threshold)?;
        Some(AlertIntent::new(kind, result.confidence, Some(*sample), now_ms))
    }
}
