//! JSON body of an alert POST.
//!
//! ```json
//! {"device_id":"KR-A1B2C3","timestamp":90000,"alert_type":"pest_risk",
//!  "confidence":85,"sensor_data":{"moisture":20.0,"temperature":35.0,
//!  "humidity":80.0,"audio":0.9},"recommendation":"..."}
//! ```
//!
//! `sensor_data` is omitted when the intent has no snapshot.

use serde::Serialize;

use crate::error::TransportError;
use crate::sensors::SensorSample;

use super::AlertIntent;

pub const CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
pub struct AlertPayload<'a> {
    pub device_id: &'a str,
    pub timestamp: u64,
    pub alert_type: &'static str,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorData>,
    pub recommendation: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SensorData {
    pub moisture: f32,
    pub temperature: f32,
    pub humidity: f32,
    pub audio: f32,
}

impl From<&SensorSample> for SensorData {
    fn from(s: &SensorSample) -> Self {
        Self {
            moisture: s.soil_moisture,
            temperature: s.temperature,
            humidity: s.humidity,
            audio: s.audio_energy,
        }
    }
}

impl<'a> AlertPayload<'a> {
    pub fn new(intent: &AlertIntent, device_id: &'a str) -> Self {
        Self {
            device_id,
            timestamp: intent.created_at,
            alert_type: intent.kind.as_str(),
            confidence: intent.confidence_pct,
            sensor_data: intent.sensor_snapshot.as_ref().map(SensorData::from),
            recommendation: intent.kind.recommendation(),
        }
    }
}

pub fn encode(intent: &AlertIntent, device_id: &str) -> Result<Vec<u8>, TransportError> {
    serde_json::to_vec(&AlertPayload::new(intent, device_id))
        .map_err(|_| TransportError::PayloadEncoding)
}
