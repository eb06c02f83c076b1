//! Inference engine boundary and the built-in reference model.
//!
//! [`InferenceEngine`] is the opaque quantized-tensor transform the
//! classifier drives.  It never owns working memory: the caller passes the
//! scratch arena into every [`invoke`](InferenceEngine::invoke).

use crate::error::InferenceError;

use super::quant::QuantParams;

/// Model schema revision this firmware understands.
pub const ENGINE_INTERFACE_VERSION: u32 = 3;

pub trait InferenceEngine {
    /// Schema revision the engine runtime implements.
    fn interface_version(&self) -> u32;
    /// Schema revision the loaded model was compiled against.
    fn model_version(&self) -> u32;
    fn input_shape(&self) -> &[usize];
    fn output_shape(&self) -> &[usize];
    fn input_quant(&self) -> QuantParams;
    fn output_quant(&self) -> QuantParams;
    /// Scratch bytes `invoke` needs.
    fn arena_required(&self) -> usize;
    /// Run the model once.  `input` and `output` are sized to the shapes.
    fn invoke(
        &mut self,
        arena: &mut [u8],
        input: &[i8],
        output: &mut [i8],
    ) -> Result<(), InferenceError>;
}

// ── Reference engine ──────────────────────────────────────────

const INPUTS: usize = 4;
const OUTPUTS: usize = 3;

const INPUT_SHAPE: [usize; 2] = [1, INPUTS];
const OUTPUT_SHAPE: [usize; 2] = [1, OUTPUTS];

const INPUT_QUANT: QuantParams = QuantParams::new(1.0 / 64.0, 0);
const OUTPUT_QUANT: QuantParams = QuantParams::new(1.0 / 256.0, -128);

/// Weight scale: one step is 1/16.
const WEIGHT_SCALE: f32 = 1.0 / 16.0;

/// Rows: normal, water stress, pest risk.
/// Columns: moisture, temperature, humidity, audio.
const WEIGHTS: [[i8; INPUTS]; OUTPUTS] = [
    [32, -16, 0, -32], // wet, mild, quiet
    [-48, 32, -16, 0], // dry, hot, low humidity
    [0, 8, 32, 48],    // humid, noisy
];

const BIASES: [f32; OUTPUTS] = [0.5, 0.5, -2.5];

/// Single dense int8 layer with softmax.  Accumulators live in the arena.
#[derive(Debug, Default)]
pub struct DenseInt8Engine {
    invocations: u32,
}

impl DenseInt8Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> u32 {
        self.invocations
    }
}

impl InferenceEngine for DenseInt8Engine {
    fn interface_version(&self) -> u32 {
        ENGINE_INTERFACE_VERSION
    }

    fn model_version(&self) -> u32 {
        ENGINE_INTERFACE_VERSION
    }

    fn input_shape(&self) -> &[usize] {
        &INPUT_SHAPE
    }

    fn output_shape(&self) -> &[usize] {
        &OUTPUT_SHAPE
    }

    fn input_quant(&self) -> QuantParams {
        INPUT_QUANT
    }

    fn output_quant(&self) -> QuantParams {
        OUTPUT_QUANT
    }

    fn arena_required(&self) -> usize {
        OUTPUTS * core::mem::size_of::<i32>()
    }

    fn invoke(
        &mut self,
        arena: &mut [u8],
        input: &[i8],
        output: &mut [i8],
    ) -> Result<(), InferenceError> {
        if input.len() != INPUTS || output.len() != OUTPUTS || arena.len() < self.arena_required()
        {
            return Err(InferenceError::InvokeFailed);
        }
        self.invocations = self.invocations.wrapping_add(1);

        // Integer accumulate: x_q has zero point 0, so no offset correction.
        for (row, chunk) in WEIGHTS.iter().zip(arena.chunks_exact_mut(4)) {
            let acc: i32 = row
                .iter()
                .zip(input)
                .map(|(&w, &x)| i32::from(w) * i32::from(x))
                .sum();
            chunk.copy_from_slice(&acc.to_le_bytes());
        }

        let mut logits = [0.0f32; OUTPUTS];
        for (i, (logit, chunk)) in logits.iter_mut().zip(arena.chunks_exact(4)).enumerate() {
            let acc = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            *logit = acc as f32 * WEIGHT_SCALE * INPUT_QUANT.scale + BIASES[i];
        }

        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let mut sum = 0.0;
        for l in &mut logits {
            *l = (*l - max).exp();
            sum += *l;
        }
        for (out, l) in output.iter_mut().zip(logits) {
            *out = super::quant::quantize(l / sum, OUTPUT_QUANT);
        }
        Ok(())
    }
}
