use servoctl_core::error::ServoError;

///Converts an rppal error into a `ServoError`. Pins the kernel won't hand out are reported as invalid pins, pins
///another handle already owns can't be switched to output mode.
pub fn from_rppal(err: rppal::gpio::Error) -> ServoError {
    match err {
        rppal::gpio::Error::PinNotAvailable(pin) => ServoError::InvalidPin(pin),
        rppal::gpio::Error::PinUsed(pin) => {
            ServoError::InvalidMode(format!("pin {} is already in use", pin))
        }
        err => ServoError::hardware(format!("RpiGpioError - Cause: {}", err)),
    }
}
