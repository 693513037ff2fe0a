//! Digital I/O seam
//!
//! The push button is wired between the input pin and ground with the
//! internal pull-up enabled, so a pressed button reads low. The LED is a
//! plain output.
//!
//! Real pins come from `rppal` behind the `rpi` feature; [`SimulatedInput`]
//! and [`SimulatedOutput`] stand in everywhere else.

use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Input pin, active-low
pub trait DigitalInput: Send {
    fn is_low(&self) -> bool;
}

/// Output pin
pub trait DigitalOutput: Send {
    fn set_high(&mut self);
    fn set_low(&mut self);
}

// === Simulated pins ===

/// Input whose level is driven through a [`SimulatedButton`]
pub struct SimulatedInput {
    low: Arc<AtomicBool>,
}

/// Handle to press and release a [`SimulatedInput`]
#[derive(Clone)]
pub struct SimulatedButton {
    low: Arc<AtomicBool>,
}

impl SimulatedInput {
    /// A released button and its handle
    pub fn new() -> (Self, SimulatedButton) {
        let low = Arc::new(AtomicBool::new(false));
        (Self { low: low.clone() }, SimulatedButton { low })
    }
}

impl DigitalInput for SimulatedInput {
    fn is_low(&self) -> bool {
        self.low.load(Ordering::SeqCst)
    }
}

impl SimulatedButton {
    pub fn press(&self) {
        self.low.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.low.store(false, Ordering::SeqCst);
    }
}

/// Output that records every level it is driven to (`true` = high)
#[derive(Clone, Default)]
pub struct SimulatedOutput {
    levels: Arc<Mutex<Vec<bool>>>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<bool> {
        self.levels.lock().clone()
    }

    pub fn is_high(&self) -> bool {
        self.levels.lock().last().copied().unwrap_or(false)
    }
}

impl DigitalOutput for SimulatedOutput {
    fn set_high(&mut self) {
        self.levels.lock().push(true);
    }

    fn set_low(&mut self) {
        self.levels.lock().push(false);
    }
}

// === Raspberry Pi pins ===

#[cfg(feature = "rpi")]
mod rpi {
    use super::{DigitalInput, DigitalOutput};
    use crate::utils::{AppError, AppResult};
    use rppal::gpio::{Gpio, InputPin, OutputPin};

    impl DigitalInput for InputPin {
        fn is_low(&self) -> bool {
            InputPin::is_low(self)
        }
    }

    impl DigitalOutput for OutputPin {
        fn set_high(&mut self) {
            OutputPin::set_high(self)
        }

        fn set_low(&mut self) {
            OutputPin::set_low(self)
        }
    }

    /// Button input (pull-up) and LED output on BCM pins
    pub fn open_pins(button_pin: u8, led_pin: u8) -> AppResult<(InputPin, OutputPin)> {
        let gpio = Gpio::new().map_err(|e| AppError::gpio(e.to_string()))?;
        let button = gpio
            .get(button_pin)
            .map_err(|e| AppError::gpio(format!("BCM {}: {}", button_pin, e)))?
            .into_input_pullup();
        let led = gpio
            .get(led_pin)
            .map_err(|e| AppError::gpio(format!("BCM {}: {}", led_pin, e)))?
            .into_output_low();
        Ok((button, led))
    }
}

#[cfg(feature = "rpi")]
pub use rpi::open_pins;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_button() {
        let (input, button) = SimulatedInput::new();
        assert!(!input.is_low());
        button.press();
        assert!(input.is_low());
        button.release();
        assert!(!input.is_low());
    }

    #[test]
    fn test_simulated_output_records_levels() {
        let led = SimulatedOutput::new();
        let mut pin = led.clone();
        pin.set_high();
        assert!(led.is_high());
        pin.set_low();
        assert_eq!(led.history(), vec![true, false]);
    }
}
