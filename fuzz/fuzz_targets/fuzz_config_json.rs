//! Fuzz target: `SystemConfig::from_json`
//!
//! Arbitrary bytes must either be rejected with a `ConfigError` or yield a
//! configuration that passes validation and produces a usable sleep period.
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use cropwatch::config::{SleepMode, SystemConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = SystemConfig::from_json(data) {
        assert!(config.validate().is_ok());
        assert!(config.sleep_duration_ms(SleepMode::Short) > 0);
        assert!(
            config.sleep_duration_ms(SleepMode::Deep) >= config.sleep_duration_ms(SleepMode::Short)
        );
        assert!(config.battery_check_every_cycles > 0);
    }
});
