//!A mod for the error types
use std::fmt::{self, Display, Formatter};

///Errors raised by pin handles, servos and ESCs. None of these are retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ServoError {
    ///The pin number is not a usable GPIO on this board.
    InvalidPin(u8),
    ///The pin can't be put into the requested mode, usually because it is already claimed.
    InvalidMode(String),
    ///Pulse width (µs) outside of the accepted window.
    InvalidPulseWidth(u32),
    ///A digital level other than 0 or 1.
    InvalidLevel(u8),
    ///Bad range or parameter when constructing a servo or ESC, or a NaN command.
    InvalidRange(String),
    ///Anything else reported by the hardware backend.
    Hardware(String),
}

impl ServoError {
    pub fn range(msg: &str) -> Self {
        ServoError::InvalidRange(msg.to_string())
    }
    pub fn hardware(msg: String) -> Self {
        ServoError::Hardware(msg)
    }
}

impl Display for ServoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPin(pin) => write!(f, "invalid pin: {}", pin),
            Self::InvalidMode(msg) => write!(f, "invalid mode: {}", msg),
            Self::InvalidPulseWidth(width) => write!(f, "invalid pulse width: {}us", width),
            Self::InvalidLevel(level) => write!(f, "invalid level: {}", level),
            Self::InvalidRange(msg) => write!(f, "invalid range: {}", msg),
            Self::Hardware(msg) => write!(f, "hardware error: {}", msg),
        }
    }
}

impl std::error::Error for ServoError {}
