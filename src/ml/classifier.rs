//! Classifier adapter: owns the engine and its scratch arena, checks the
//! model schema once, and turns feature vectors into classification
//! results under a time budget.
//!
//! ```text
//!   Uninitialized ──initialize()──▶ Ready
//!         │                           │
//!         └──── schema mismatch ──────┴──▶ Halted (no inference)
//! ```
//!
//! A slow inference is still a valid answer: it is returned with
//! `over_budget = true` and the caller decides how to report it.

use log::{info, warn};
use serde::Serialize;

use crate::app::ports::ClockPort;
use crate::error::InferenceError;

use super::engine::InferenceEngine;
use super::features::{FEATURE_COUNT, FeatureVector};
use super::quant::{MAX_TENSOR_LEN, QuantParams, QuantizedTensor, Quantizer};

pub const CLASS_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClassLabel {
    Normal,
    WaterStress,
    PestRisk,
    Unknown,
}

impl ClassLabel {
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Normal,
            1 => Self::WaterStress,
            2 => Self::PestRisk,
            _ => Self::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::WaterStress => "Water Stress",
            Self::PestRisk => "Pest Risk",
            Self::Unknown => "Unknown",
        }
    }
}

/// Shapes and quantization fixed at initialisation.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSchema {
    pub model_version: u32,
    pub input_shape: heapless::Vec<usize, 4>,
    pub output_shape: heapless::Vec<usize, 4>,
    pub input_quant: QuantParams,
    pub output_quant: QuantParams,
}

/// Raw engine output for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutput {
    pub tensor: QuantizedTensor,
    pub elapsed_us: u32,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub predicted_class: ClassLabel,
    /// Equal to `raw_scores[predicted_class]`.
    pub confidence: f32,
    pub raw_scores: [f32; CLASS_COUNT],
    pub inference_time_us: u32,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub arena_used: usize,
    pub arena_size: usize,
    pub quantized: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum AdapterState {
    Uninitialized,
    Ready(ModelSchema, Quantizer),
    Halted,
}

pub struct ClassifierAdapter<E> {
    engine: E,
    arena: Box<[u8]>,
    arena_bytes: usize,
    budget_us: u32,
    state: AdapterState,
}

impl<E: InferenceEngine> ClassifierAdapter<E> {
    /// The arena is not allocated until [`initialize`](Self::initialize).
    pub fn new(engine: E, arena_bytes: usize, budget_us: u32) -> Self {
        Self {
            engine,
            arena: Box::default(),
            arena_bytes,
            budget_us,
            state: AdapterState::Uninitialized,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, AdapterState::Ready(..))
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, AdapterState::Halted)
    }

    /// Validate the model against the engine and allocate the arena.
    ///
    /// `SchemaMismatch` halts the adapter; `infer` then refuses to run.
    pub fn initialize(&mut self) -> Result<ModelSchema, InferenceError> {
        match self.check_schema() {
            Ok(schema) => {
                self.allocate_arena()?;
                let quantizer = Quantizer::new(schema.input_quant, schema.output_quant);
                info!(
                    "classifier: model v{} ready, arena {} / {} bytes",
                    schema.model_version,
                    self.engine.arena_required(),
                    self.arena.len()
                );
                self.state = AdapterState::Ready(schema.clone(), quantizer);
                Ok(schema)
            }
            Err(e) => {
                warn!("classifier: {e}, inference halted");
                self.state = AdapterState::Halted;
                Err(e)
            }
        }
    }

    fn check_schema(&self) -> Result<ModelSchema, InferenceError> {
        let model_version = self.engine.model_version();
        if model_version != self.engine.interface_version() {
            warn!(
                "classifier: model schema v{model_version} != engine v{}",
                self.engine.interface_version()
            );
            return Err(InferenceError::SchemaMismatch);
        }

        let input_shape = heapless::Vec::from_slice(self.engine.input_shape())
            .map_err(|_| InferenceError::SchemaMismatch)?;
        let output_shape = heapless::Vec::from_slice(self.engine.output_shape())
            .map_err(|_| InferenceError::SchemaMismatch)?;
        if element_count(&input_shape) != FEATURE_COUNT
            || element_count(&output_shape) != CLASS_COUNT
        {
            return Err(InferenceError::SchemaMismatch);
        }

        let input_quant = self.engine.input_quant();
        let output_quant = self.engine.output_quant();
        if !input_quant.is_valid() || !output_quant.is_valid() {
            return Err(InferenceError::SchemaMismatch);
        }

        Ok(ModelSchema {
            model_version,
            input_shape,
            output_shape,
            input_quant,
            output_quant,
        })
    }

    /// Sized once; a second initialise reuses the existing arena.
    fn allocate_arena(&mut self) -> Result<(), InferenceError> {
        if self.engine.arena_required() > self.arena_bytes {
            return Err(InferenceError::AllocationFailed);
        }
        if self.arena.is_empty() {
            let mut buf = Vec::new();
            buf.try_reserve_exact(self.arena_bytes)
                .map_err(|_| InferenceError::AllocationFailed)?;
            buf.resize(self.arena_bytes, 0u8);
            self.arena = buf.into_boxed_slice();
        }
        Ok(())
    }

    /// Run the engine on an already quantized input.
    pub fn infer<C: ClockPort + ?Sized>(
        &mut self,
        input: &QuantizedTensor,
        clock: &C,
    ) -> Result<InferenceOutput, InferenceError> {
        let AdapterState::Ready(schema, _) = &self.state else {
            return Err(InferenceError::NotInitialized);
        };
        if input.params != schema.input_quant || input.len() != FEATURE_COUNT {
            warn!("classifier: input tensor does not match model schema");
            return Err(InferenceError::InvokeFailed);
        }
        let output_quant = schema.output_quant;

        let mut out = [0i8; MAX_TENSOR_LEN];
        let out = &mut out[..CLASS_COUNT];

        let start = clock.now_us();
        self.engine.invoke(&mut self.arena, &input.values, out)?;
        let elapsed_us =
            u32::try_from(clock.now_us().saturating_sub(start)).unwrap_or(u32::MAX);

        let over_budget = elapsed_us > self.budget_us;
        if over_budget {
            warn!(
                "classifier: inference took {elapsed_us} us (budget {} us)",
                self.budget_us
            );
        }

        Ok(InferenceOutput {
            tensor: QuantizedTensor::from_raw(out, output_quant)?,
            elapsed_us,
            over_budget,
        })
    }

    /// Quantize, infer, dequantize and pick the winning class.
    pub fn classify<C: ClockPort + ?Sized>(
        &mut self,
        features: &FeatureVector,
        clock: &C,
    ) -> Result<ClassificationResult, InferenceError> {
        let AdapterState::Ready(_, quantizer) = &self.state else {
            return Err(InferenceError::NotInitialized);
        };
        let quantizer = *quantizer;

        let input = quantizer.quantize_input(features)?;
        let output = self.infer(&input, clock)?;
        let raw_scores: [f32; CLASS_COUNT] = quantizer.dequantize_scores(&output.tensor)?;

        let winner = super::decision::argmax(&raw_scores);
        Ok(ClassificationResult {
            predicted_class: ClassLabel::from_index(winner),
            confidence: raw_scores[winner],
            raw_scores,
            inference_time_us: output.elapsed_us,
            over_budget: output.over_budget,
        })
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        let AdapterState::Ready(schema, _) = &self.state else {
            return None;
        };
        Some(ModelInfo {
            input_bytes: element_count(&schema.input_shape),
            output_bytes: element_count(&schema.output_shape),
            arena_used: self.engine.arena_required(),
            arena_size: self.arena.len(),
            quantized: true,
        })
    }
}

fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}
