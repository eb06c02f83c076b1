//! Fuzz target: `sht31::decode_frame`
//!
//! Any 6-byte frame either fails its CRC check or decodes into the
//! sensor's physical range.
//!
//! cargo fuzz run fuzz_sht31_frame

#![no_main]

use cropwatch::sensors::sht31::decode_frame;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = <&[u8; 6]>::try_from(data) else {
        return;
    };
    if let Ok(reading) = decode_frame(frame) {
        assert!((-45.0..=130.0).contains(&reading.temperature_c));
        assert!((0.0..=100.0).contains(&reading.humidity_pct));
    }
});
