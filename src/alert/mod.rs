//! Alert intents and their static presentation table.
//!
//! An [`AlertIntent`] is a decision to notify the backend, created by the
//! decision policy or the battery check and consumed exactly once by the
//! [`dispatcher::AlertDispatcher`].

pub mod dispatcher;
pub mod payload;

use serde::Serialize;

use crate::sensors::SensorSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertKind {
    WaterStress,
    PestRisk,
    LowBattery,
    SystemError,
}

/// Wire name and operator advice for one alert kind.
#[derive(Debug)]
pub struct AlertProfile {
    pub alert_type: &'static str,
    pub recommendation: &'static str,
}

/// Indexed by `AlertKind as usize`.
static PROFILES: [AlertProfile; 4] = [
    AlertProfile {
        alert_type: "water_stress",
        recommendation: "Initiate irrigation in affected area",
    },
    AlertProfile {
        alert_type: "pest_risk",
        recommendation: "Inspect crops for pest activity and consider treatment",
    },
    AlertProfile {
        alert_type: "low_battery",
        recommendation: "Check solar panel and charging system",
    },
    AlertProfile {
        alert_type: "unknown",
        recommendation: "Monitor situation",
    },
];

impl AlertKind {
    pub const ALL: [Self; 4] = [
        Self::WaterStress,
        Self::PestRisk,
        Self::LowBattery,
        Self::SystemError,
    ];

    pub fn profile(self) -> &'static AlertProfile {
        &PROFILES[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.profile().alert_type
    }

    pub fn recommendation(self) -> &'static str {
        self.profile().recommendation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertIntent {
    pub kind: AlertKind,
    /// 0-100.
    pub confidence_pct: u8,
    pub sensor_snapshot: Option<SensorSample>,
    /// Milliseconds since boot.
    pub created_at: u64,
}

impl AlertIntent {
    pub fn new(
        kind: AlertKind,
        confidence: f32,
        sensor_snapshot: Option<SensorSample>,
        created_at: u64,
    ) -> Self {
        Self {
            kind,
            confidence_pct: confidence_pct(confidence),
            sensor_snapshot,
            created_at,
        }
    }

    /// Battery alerts carry no snapshot and no classifier confidence.
    pub fn low_battery(created_at: u64) -> Self {
        Self::new(AlertKind::LowBattery, 0.0, None, created_at)
    }
}

/// `round(confidence * 100)`, clamped to `0..=100`; NaN is 0.
pub fn confidence_pct(confidence: f32) -> u8 {
    if confidence.is_nan() {
        return 0;
    }
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}
