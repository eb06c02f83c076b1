//! Affine int8 quantization.
//!
//! ```text
//!   q = clamp(round(f / scale) + zero_point, -128, 127)
//!   f = (q - zero_point) * scale
//! ```
//!
//! Rounding is half away from zero (`f32::round`).  NaN quantizes to the
//! zero point.  Every tensor carries the parameters it was quantized with,
//! so an input tensor can never be dequantized with output parameters.

use serde::Serialize;

use crate::error::InferenceError;

/// Largest tensor the pipeline moves around (elements).
pub const MAX_TENSOR_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

impl QuantParams {
    pub const fn new(scale: f32, zero_point: i32) -> Self {
        Self { scale, zero_point }
    }

    /// Scale must be finite and positive; zero point must fit in i8.
    pub fn is_valid(&self) -> bool {
        self.scale.is_finite()
            && self.scale > 0.0
            && (i32::from(i8::MIN)..=i32::from(i8::MAX)).contains(&self.zero_point)
    }

    /// Float range representable without saturation.
    pub fn representable_range(&self) -> (f32, f32) {
        (dequantize(i8::MIN, *self), dequantize(i8::MAX, *self))
    }
}

pub fn quantize(value: f32, params: QuantParams) -> i8 {
    let lo = i32::from(i8::MIN);
    let hi = i32::from(i8::MAX);
    if value.is_nan() {
        return params.zero_point.clamp(lo, hi) as i8;
    }
    // `as i32` saturates on overflow and infinities.
    let steps = (value / params.scale).round() as i32;
    steps.saturating_add(params.zero_point).clamp(lo, hi) as i8
}

pub fn dequantize(q: i8, params: QuantParams) -> f32 {
    (i32::from(q) - params.zero_point) as f32 * params.scale
}

/// Int8 values plus the parameters that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedTensor {
    pub values: heapless::Vec<i8, MAX_TENSOR_LEN>,
    pub params: QuantParams,
}

impl QuantizedTensor {
    pub fn from_floats(values: &[f32], params: QuantParams) -> Result<Self, InferenceError> {
        let mut out = heapless::Vec::new();
        for &v in values {
            out.push(quantize(v, params))
                .map_err(|_| InferenceError::InvokeFailed)?;
        }
        Ok(Self {
            values: out,
            params,
        })
    }

    pub fn from_raw(values: &[i8], params: QuantParams) -> Result<Self, InferenceError> {
        let values =
            heapless::Vec::from_slice(values).map_err(|_| InferenceError::InvokeFailed)?;
        Ok(Self { values, params })
    }

    /// Dequantize with this tensor's own parameters.
    pub fn dequantize_into(&self, out: &mut [f32]) {
        for (slot, &q) in out.iter_mut().zip(self.values.iter()) {
            *slot = dequantize(q, self.params);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Input/output parameter pair fixed when the classifier is initialised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    input: QuantParams,
    output: QuantParams,
}

impl Quantizer {
    pub fn new(input: QuantParams, output: QuantParams) -> Self {
        Self { input, output }
    }

    pub fn input_params(&self) -> QuantParams {
        self.input
    }

    pub fn output_params(&self) -> QuantParams {
        self.output
    }

    pub fn quantize_input(&self, features: &[f32]) -> Result<QuantizedTensor, InferenceError> {
        QuantizedTensor::from_floats(features, self.input)
    }

    /// Dequantize classifier scores, clamped to `[0, 1]`.  The tensor must
    /// carry the output parameters.
    pub fn dequantize_scores<const N: usize>(
        &self,
        tensor: &QuantizedTensor,
    ) -> Result<[f32; N], InferenceError> {
        if tensor.params != self.output || tensor.len() != N {
            return Err(InferenceError::InvokeFailed);
        }
        let mut scores = [0.0; N];
        tensor.dequantize_into(&mut scores);
        for s in &mut scores {
            *s = s.clamp(0.0, 1.0);
        }
        Ok(scores)
    }
}
