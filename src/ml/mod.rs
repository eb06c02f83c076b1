//! On-device classification pipeline.
//!
//! ```text
//!   SensorSample ─▶ features ─▶ quant ─▶ classifier(engine) ─▶ quant ─▶ decision
//! ```
//!
//! Everything here is cycle-scoped and allocation-free except the scratch
//! arena, which [`classifier::ClassifierAdapter`] allocates once.

pub mod classifier;
pub mod decision;
pub mod engine;
pub mod features;
pub mod quant;
