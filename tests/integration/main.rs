//! Integration test driver for `tests/integration/`.
//!
//! Each `mod` below maps to a file that exercises one subsystem against
//! mock adapters.  Everything runs on the host with no hardware attached.

mod mock_hw;
mod pipeline_tests;
mod scheduler_tests;
