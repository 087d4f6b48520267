use std::time::Duration;

use rppal::gpio::OutputPin;
use servoctl_core::{
    check_pin, check_pulse_width, error::ServoError, Board, Level, PowerSwitch, PulseOutput, SERVO_PERIOD_US,
};
use tracing::debug;

use crate::error::from_rppal;

///One gpio session. Pins handed out by it are reset when they are dropped.
pub struct RpiGpio {
    gpio: rppal::gpio::Gpio,
}

impl RpiGpio {
    pub fn new() -> Result<Self, ServoError> {
        let gpio = rppal::gpio::Gpio::new().map_err(|rppal_err| {
            ServoError::hardware(format!("error creating gpio: {}", rppal_err))
        })?;
        Ok(Self { gpio })
    }

    fn output_pin(&self, pin: u8, initial: Level) -> Result<OutputPin, ServoError> {
        check_pin(pin)?;
        let pin = self.gpio.get(pin).map_err(from_rppal)?;
        let pin = match initial {
            Level::Low => pin.into_output_low(),
            Level::High => pin.into_output_high(),
        };
        Ok(pin)
    }
}

impl Board for RpiGpio {
    type Pulse = RpiPulseOutput;
    type Switch = RpiPowerSwitch;

    fn pulse_output(&mut self, pin: u8) -> Result<RpiPulseOutput, ServoError> {
        let out = self.output_pin(pin, Level::Low)?;
        debug!("gpio pulse output on pin {}", pin);
        Ok(RpiPulseOutput { pin: out, width_us: 0 })
    }

    fn power_switch(&mut self, pin: u8, initial: Level) -> Result<RpiPowerSwitch, ServoError> {
        let out = self.output_pin(pin, initial)?;
        debug!("gpio power switch on pin {}, starting {:?}", pin, initial);
        Ok(RpiPowerSwitch { pin: out })
    }
}

///Servo pulses generated with rppal's software pwm at a 20 ms period.
pub struct RpiPulseOutput {
    pin: OutputPin,
    width_us: u32,
}

impl PulseOutput for RpiPulseOutput {
    fn pin(&self) -> u8 {
        self.pin.pin()
    }

    fn set_pulse_width(&mut self, width_us: u32) -> Result<(), ServoError> {
        check_pulse_width(width_us)?;
        if width_us == 0 {
            self.pin.clear_pwm().map_err(from_rppal)?;
            self.pin.set_low();
        } else {
            self.pin
                .set_pwm(
                    Duration::from_micros(SERVO_PERIOD_US as u64),
                    Duration::from_micros(width_us as u64),
                )
                .map_err(from_rppal)?;
        }
        self.width_us = width_us;
        Ok(())
    }

    fn pulse_width(&self) -> u32 {
        self.width_us
    }
}

pub struct RpiPowerSwitch {
    pin: OutputPin,
}

impl PowerSwitch for RpiPowerSwitch {
    fn pin(&self) -> u8 {
        self.pin.pin()
    }

    fn set_level(&mut self, level: Level) -> Result<(), ServoError> {
        match level {
            Level::Low => self.pin.set_low(),
            Level::High => self.pin.set_high(),
        }
        Ok(())
    }

    fn level(&self) -> Level {
        Level::from(self.pin.is_set_high())
    }
}
