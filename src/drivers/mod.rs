//! Peripheral drivers: ADC bring-up, analog inputs and status LEDs.

pub mod analog;
pub mod hw_init;
pub mod status_led;
