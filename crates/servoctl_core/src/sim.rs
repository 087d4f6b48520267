//!An in-memory `Board`. Every write is validated the same way the hardware would validate it, then logged and
//!recorded so a run can be inspected afterwards.

use std::collections::HashSet;

use tracing::debug;

use crate::{check_pin, check_pulse_width, error::ServoError, Board, Level, PowerSwitch, PulseOutput};

#[derive(Debug, Default)]
pub struct SimBoard {
    claimed: HashSet<u8>,
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim(&mut self, pin: u8) -> Result<(), ServoError> {
        check_pin(pin)?;
        if !self.claimed.insert(pin) {
            return Err(ServoError::InvalidMode(format!("pin {} is already in use", pin)));
        }
        Ok(())
    }
}

impl Board for SimBoard {
    type Pulse = SimPulseOutput;
    type Switch = SimPowerSwitch;

    fn pulse_output(&mut self, pin: u8) -> Result<SimPulseOutput, ServoError> {
        self.claim(pin)?;
        debug!("sim pulse output on pin {}", pin);
        Ok(SimPulseOutput {
            pin,
            width_us: 0,
            history: Vec::new(),
        })
    }

    fn power_switch(&mut self, pin: u8, initial: Level) -> Result<SimPowerSwitch, ServoError> {
        self.claim(pin)?;
        debug!("sim power switch on pin {}, starting {:?}", pin, initial);
        Ok(SimPowerSwitch {
            pin,
            level: initial,
            history: vec![initial],
        })
    }
}

#[derive(Debug)]
pub struct SimPulseOutput {
    pin: u8,
    width_us: u32,
    history: Vec<u32>,
}

impl SimPulseOutput {
    ///Every pulse width written so far, oldest first.
    pub fn history(&self) -> &[u32] {
        &self.history
    }
}

impl PulseOutput for SimPulseOutput {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn set_pulse_width(&mut self, width_us: u32) -> Result<(), ServoError> {
        check_pulse_width(width_us)?;
        debug!("sim pin {}: pulse width {}us", self.pin, width_us);
        self.width_us = width_us;
        self.history.push(width_us);
        Ok(())
    }

    fn pulse_width(&self) -> u32 {
        self.width_us
    }
}

#[derive(Debug)]
pub struct SimPowerSwitch {
    pin: u8,
    level: Level,
    history: Vec<Level>,
}

impl SimPowerSwitch {
    ///Every level driven so far, including the initial one.
    pub fn history(&self) -> &[Level] {
        &self.history
    }
}

impl PowerSwitch for SimPowerSwitch {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn set_level(&mut self, level: Level) -> Result<(), ServoError> {
        debug!("sim pin {}: level {:?}", self.pin, level);
        self.level = level;
        self.history.push(level);
        Ok(())
    }

    fn level(&self) -> Level {
        self.level
    }
}
