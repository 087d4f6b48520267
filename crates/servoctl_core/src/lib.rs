//!This is the core library for servoctl. It holds the hardware-facing traits, the angular servo and ESC logic, and a
//!simulated board. Hardware backends (like `servoctl_rpi_gpio`) implement the traits defined here.

use error::ServoError;
use std::ops::Not;

pub mod error;
pub mod esc;
pub mod servo;
pub mod sim;

///Highest BCM gpio number that can carry a servo pulse.
pub const MAX_USER_GPIO: u8 = 31;

///Shortest non-zero servo pulse, in microseconds.
pub const MIN_SERVO_PULSE_US: u32 = 500;

///Longest servo pulse, in microseconds.
pub const MAX_SERVO_PULSE_US: u32 = 2500;

///Servo frame period (50 Hz).
pub const SERVO_PERIOD_US: u32 = 20_000;

///Logic level of a digital output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl TryFrom<u8> for Level {
    type Error = ServoError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Level::Low),
            1 => Ok(Level::High),
            other => Err(ServoError::InvalidLevel(other)),
        }
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

///Returns an error unless `pin` is a user gpio.
pub fn check_pin(pin: u8) -> Result<(), ServoError> {
    if pin > MAX_USER_GPIO {
        Err(ServoError::InvalidPin(pin))
    } else {
        Ok(())
    }
}

///Returns an error unless `width_us` is 0 (off) or inside the servo pulse window.
pub fn check_pulse_width(width_us: u32) -> Result<(), ServoError> {
    if width_us == 0 || (MIN_SERVO_PULSE_US..=MAX_SERVO_PULSE_US).contains(&width_us) {
        Ok(())
    } else {
        Err(ServoError::InvalidPulseWidth(width_us))
    }
}

///A pin producing servo-style pulses. The width is given in microseconds and 0 turns the signal off.
pub trait PulseOutput {
    fn pin(&self) -> u8;

    fn set_pulse_width(&mut self, width_us: u32) -> Result<(), ServoError>;

    ///The last commanded pulse width.
    fn pulse_width(&self) -> u32;
}

///A plain digital output, e.g. the pin switching the ESC power relay.
pub trait PowerSwitch {
    fn pin(&self) -> u8;

    fn set_level(&mut self, level: Level) -> Result<(), ServoError>;

    ///Reads the level currently driven on the pin.
    fn level(&self) -> Level;
}

///A source of pin handles. A `Board` represents one gpio session, either real hardware or the simulator.
///
/// Each pin can only be claimed once per session; asking for a claimed pin fails with `ServoError::InvalidMode`.
pub trait Board {
    type Pulse: PulseOutput;
    type Switch: PowerSwitch;

    fn pulse_output(&mut self, pin: u8) -> Result<Self::Pulse, ServoError>;

    fn power_switch(&mut self, pin: u8, initial: Level) -> Result<Self::Switch, ServoError>;
}
