//! Hardware trigger
//!
//! - [`gpio`] - digital pin seam (rppal or simulated)
//! - [`debounce`] - press detection state machine
//! - [`button`] - reprint requests from the push button

pub mod button;
pub mod debounce;
pub mod gpio;

pub use button::{HardwareTrigger, NO_BRIEFING_NOTICE, PressOutcome};
pub use debounce::{DebounceState, Debouncer};
pub use gpio::{DigitalInput, DigitalOutput, SimulatedButton, SimulatedInput, SimulatedOutput};

#[cfg(feature = "rpi")]
pub use gpio::open_pins;
