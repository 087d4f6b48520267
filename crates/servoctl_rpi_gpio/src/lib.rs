//!This library provides a servoctl `Board` backed by the Raspberry Pi GPIO pins. It is a wrapper around the rppal library.

//internal error conversion for rppal
pub mod error;

//servo pulses and relay switching on bare gpio pins
pub mod gpio;

pub use gpio::{RpiGpio, RpiPowerSwitch, RpiPulseOutput};
