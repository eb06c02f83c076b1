//! Green / red status LEDs.
//!
//! Two discrete LEDs on plain GPIO outputs, driven through the
//! `embedded-hal` [`OutputPin`] trait so host tests can use mock pins.
//! Green means a confident NORMAL classification, red means the cycle
//! raised an alert intent.  Both go dark before sleep.

use embedded_hal::digital::OutputPin;
use log::warn;

use crate::app::ports::{StatusIndication, StatusPort};

pub struct StatusLed<G, R> {
    green: G,
    red: R,
    current: StatusIndication,
}

impl<G: OutputPin, R: OutputPin> StatusLed<G, R> {
    pub fn new(green: G, red: R) -> Self {
        let mut led = Self {
            green,
            red,
            current: StatusIndication::Off,
        };
        led.apply(StatusIndication::Off);
        led
    }

    pub fn current(&self) -> StatusIndication {
        self.current
    }

    fn apply(&mut self, status: StatusIndication) {
        let (green, red) = match status {
            StatusIndication::Normal => (true, false),
            StatusIndication::Alert => (false, true),
            StatusIndication::Off => (false, false),
        };
        let ok = set_level(&mut self.green, green) & set_level(&mut self.red, red);
        if !ok {
            warn!("status_led: GPIO write failed for {:?}", status);
        }
        self.current = status;
    }

    /// Release the pins.
    pub fn release(self) -> (G, R) {
        (self.green, self.red)
    }
}

fn set_level<P: OutputPin>(pin: &mut P, high: bool) -> bool {
    let r = if high { pin.set_high() } else { pin.set_low() };
    r.is_ok()
}

impl<G: OutputPin, R: OutputPin> StatusPort for StatusLed<G, R> {
    fn show(&mut self, status: StatusIndication) {
        self.apply(status);
    }
}
