//! Mock board, transport, event sink and engine for integration tests.
//!
//! `MockBoard` implements every hardware port the scheduler needs and
//! records each call, so tests can assert on the full history without
//! touching real ADC/I2C/GPIO.  Its clock only moves when the scheduler
//! sleeps (plus an optional per-read tick).

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use cropwatch::app::events::AppEvent;
use cropwatch::app::ports::{
    AlertTransport, BatteryPort, ClockPort, EventSink, SensorPort, StatusIndication, StatusPort,
    TimerPort,
};
use cropwatch::config::SleepMode;
use cropwatch::error::{InferenceError, SensorError, TransportError};
use cropwatch::ml::engine::{ENGINE_INTERFACE_VERSION, InferenceEngine};
use cropwatch::ml::quant::{QuantParams, quantize};
use cropwatch::sensors::SensorSample;

// ── Samples ───────────────────────────────────────────────────

/// Humid, noisy field: the reference model calls this pest risk.
pub fn pest_sample() -> SensorSample {
    SensorSample {
        soil_moisture: 20.0,
        temperature: 35.0,
        humidity: 80.0,
        audio_energy: 0.9,
        timestamp: 0,
    }
}

/// Dry, hot field: water stress.
pub fn dry_sample() -> SensorSample {
    SensorSample {
        soil_moisture: 10.0,
        temperature: 46.0,
        humidity: 20.0,
        audio_energy: 0.1,
        timestamp: 0,
    }
}

/// Unremarkable field: normal, no alert.
pub fn calm_sample() -> SensorSample {
    SensorSample {
        soil_moisture: 50.0,
        temperature: 25.0,
        humidity: 50.0,
        audio_energy: 0.1,
        timestamp: 0,
    }
}

// ── MockBoard ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoardCall {
    Read,
    Battery,
    Show(StatusIndication),
    Suspend,
    Resume,
    Sleep(u32, SleepMode),
}

pub struct MockBoard {
    /// Consumed front to back; `fallback` once empty.
    pub script: VecDeque<Result<SensorSample, SensorError>>,
    pub fallback: Result<SensorSample, SensorError>,
    pub voltage: Result<f32, SensorError>,
    pub calls: Vec<BoardCall>,
    pub suspended: bool,
    pub reads_while_suspended: u32,
    now_us: Cell<u64>,
    /// Added to the clock on every `now_us()` call.
    pub tick_us: u64,
}

impl MockBoard {
    pub fn new(sample: SensorSample) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: Ok(sample),
            voltage: Ok(3.9),
            calls: Vec::new(),
            suspended: false,
            reads_while_suspended: 0,
            now_us: Cell::new(1_000_000),
            tick_us: 0,
        }
    }

    pub fn then(mut self, reading: Result<SensorSample, SensorError>) -> Self {
        self.script.push_back(reading);
        self
    }

    pub fn with_voltage(mut self, v: f32) -> Self {
        self.voltage = Ok(v);
        self
    }

    pub fn set_sample(&mut self, sample: SensorSample) {
        self.fallback = Ok(sample);
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.now_us.set(self.now_us.get() + ms * 1000);
    }

    pub fn sleeps(&self) -> Vec<(u32, SleepMode)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Sleep(ms, mode) => Some((*ms, *mode)),
                _ => None,
            })
            .collect()
    }

    pub fn statuses(&self) -> Vec<StatusIndication> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                BoardCall::Show(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: BoardCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl SensorPort for MockBoard {
    fn read(&mut self, timestamp: u64) -> Result<SensorSample, SensorError> {
        self.calls.push(BoardCall::Read);
        if self.suspended {
            self.reads_while_suspended += 1;
        }
        let reading = self.script.pop_front().unwrap_or(self.fallback);
        reading.map(|s| SensorSample { timestamp, ..s })
    }

    fn suspend(&mut self) {
        self.calls.push(BoardCall::Suspend);
        self.suspended = true;
    }

    fn resume(&mut self) {
        self.calls.push(BoardCall::Resume);
        self.suspended = false;
    }
}

impl BatteryPort for MockBoard {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        self.calls.push(BoardCall::Battery);
        self.voltage
    }
}

impl StatusPort for MockBoard {
    fn show(&mut self, status: StatusIndication) {
        self.calls.push(BoardCall::Show(status));
    }
}

impl ClockPort for MockBoard {
    fn now_us(&self) -> u64 {
        let now = self.now_us.get();
        self.now_us.set(now + self.tick_us);
        now
    }
}

impl TimerPort for MockBoard {
    fn sleep(&mut self, duration_ms: u32, mode: SleepMode) {
        self.calls.push(BoardCall::Sleep(duration_ms, mode));
        self.advance_ms(u64::from(duration_ms));
    }
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Post {
    pub path: String,
    pub content_type: String,
    pub body: String,
}

pub struct MockTransport {
    pub connected: bool,
    pub link_available: bool,
    /// Answers consumed front to back; 200 once empty.
    pub statuses: VecDeque<u16>,
    pub posts: Vec<Post>,
    pub connect_attempts: u32,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            connected: false,
            link_available: true,
            statuses: VecDeque::new(),
            posts: Vec::new(),
            connect_attempts: 0,
        }
    }

    pub fn offline() -> Self {
        Self {
            link_available: false,
            ..Self::new()
        }
    }

    pub fn answering(statuses: &[u16]) -> Self {
        Self {
            statuses: statuses.iter().copied().collect(),
            ..Self::new()
        }
    }

    pub fn last_json(&self) -> serde_json::Value {
        let post = self.posts.last().expect("no alert was posted");
        serde_json::from_str(&post.body).expect("payload is not JSON")
    }
}

impl AlertTransport for MockTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self, _timeout_ms: u32) -> bool {
        self.connect_attempts += 1;
        self.connected = self.link_available;
        self.connected
    }

    fn post(&mut self, path: &str, content_type: &str, body: &[u8]) -> Result<u16, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.posts.push(Post {
            path: path.to_owned(),
            content_type: content_type.to_owned(),
            body: String::from_utf8(body.to_vec()).expect("payload is not UTF-8"),
        });
        Ok(self.statuses.pop_front().unwrap_or(200))
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedEngine ────────────────────────────────────────────

pub const SCRIPTED_OUTPUT_QUANT: QuantParams = QuantParams::new(1.0 / 256.0, -128);

/// Engine that ignores its input and answers with fixed class scores.
pub struct ScriptedEngine {
    pub output: [i8; 3],
    pub model_version: u32,
    pub arena_required: usize,
    pub fail_invoke: bool,
    pub inputs: Vec<Vec<i8>>,
}

impl ScriptedEngine {
    pub fn new(scores: [f32; 3]) -> Self {
        Self {
            output: scores.map(|s| quantize(s, SCRIPTED_OUTPUT_QUANT)),
            model_version: ENGINE_INTERFACE_VERSION,
            arena_required: 64,
            fail_invoke: false,
            inputs: Vec::new(),
        }
    }
}

impl InferenceEngine for ScriptedEngine {
    fn interface_version(&self) -> u32 {
        ENGINE_INTERFACE_VERSION
    }

    fn model_version(&self) -> u32 {
        self.model_version
    }

    fn input_shape(&self) -> &[usize] {
        &[1, 4]
    }

    fn output_shape(&self) -> &[usize] {
        &[1, 3]
    }

    fn input_quant(&self) -> QuantParams {
        QuantParams::new(1.0 / 64.0, 0)
    }

    fn output_quant(&self) -> QuantParams {
        SCRIPTED_OUTPUT_QUANT
    }

    fn arena_required(&self) -> usize {
        self.arena_required
    }

    fn invoke(
        &mut self,
        _arena: &mut [u8],
        input: &[i8],
        output: &mut [i8],
    ) -> Result<(), InferenceError> {
        if self.fail_invoke {
            return Err(InferenceError::InvokeFailed);
        }
        self.inputs.push(input.to_vec());
        output.copy_from_slice(&self.output);
        Ok(())
    }
}
