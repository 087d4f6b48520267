//!Electronic speed controller driven as an angular servo, with its power button replaced by a relay on a gpio pin.
//!
//!Throttle is a signed value between `full_rev_throttle` and `full_fwd_throttle`. The ESC doesn't move the motor for
//!small throttle magnitudes, so `set_throttle` shifts any non-neutral command past that dead zone.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    error::ServoError,
    servo::{AngularServo, ServoRange},
    Level, PowerSwitch, PulseOutput,
};

///Delays used by the power-up handshakes, in milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CalibrationTiming {
    pub hold_max_ms: u64,
    pub beep_wait_ms: u64,
    pub hold_neutral_ms: u64,
    pub startup_beep_ms: u64,
    pub start_wait_ms: u64,
}

impl Default for CalibrationTiming {
    fn default() -> Self {
        Self {
            hold_max_ms: 2000,
            beep_wait_ms: 1000,
            hold_neutral_ms: 2000,
            startup_beep_ms: 1000,
            start_wait_ms: 2000,
        }
    }
}

///Throttle mapping and power relay parameters. Defaults match a DYNM3876 ESC on a 12v relay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EscConfig {
    pub full_rev_throttle: f64,
    pub full_fwd_throttle: f64,
    pub min_pulse_width_us: u32,
    pub max_pulse_width_us: u32,
    pub neutral_throttle: f64,
    ///Smallest forward throttle that moves the motor.
    pub min_fwd_throttle: f64,
    ///Smallest (in magnitude) reverse throttle that moves the motor.
    pub min_rev_throttle: f64,
    ///Level on the relay pin that powers the ESC, 0 or 1.
    pub power_on_level: u8,
    pub timing: CalibrationTiming,
}

impl Default for EscConfig {
    fn default() -> Self {
        Self {
            full_rev_throttle: -90.0,
            full_fwd_throttle: 90.0,
            min_pulse_width_us: 1000,
            max_pulse_width_us: 2000,
            neutral_throttle: 0.0,
            min_fwd_throttle: 10.1,
            min_rev_throttle: -8.1,
            power_on_level: 1,
            timing: CalibrationTiming::default(),
        }
    }
}

impl EscConfig {
    fn servo_range(&self) -> ServoRange {
        ServoRange {
            min_angle: self.full_rev_throttle,
            max_angle: self.full_fwd_throttle,
            min_pulse_width_us: self.min_pulse_width_us,
            max_pulse_width_us: self.max_pulse_width_us,
        }
    }
}

pub struct Esc<P, S> {
    servo: AngularServo<P>,
    power: S,
    on_level: Level,
    neutral_throttle: f64,
    min_fwd_throttle: f64,
    min_rev_throttle: f64,
    timing: CalibrationTiming,
}

impl<P: PulseOutput, S: PowerSwitch> Esc<P, S> {
    ///Builds the ESC and makes sure it starts powered off.
    pub fn new(output: P, power: S, cfg: &EscConfig) -> Result<Self, ServoError> {
        let servo = AngularServo::new(output, cfg.servo_range())?;
        let on_level = Level::try_from(cfg.power_on_level)?;
        let neutral = cfg.neutral_throttle;
        if neutral.is_nan() || neutral < cfg.full_rev_throttle || neutral > cfg.full_fwd_throttle {
            return Err(ServoError::range("neutral_throttle must lie within the throttle range"));
        }
        if cfg.min_fwd_throttle.is_nan() || cfg.min_rev_throttle.is_nan() {
            return Err(ServoError::range("min_fwd_throttle and min_rev_throttle can't be NaN"));
        }
        let mut esc = Self {
            servo,
            power,
            on_level,
            neutral_throttle: neutral,
            min_fwd_throttle: cfg.min_fwd_throttle,
            min_rev_throttle: cfg.min_rev_throttle,
            timing: cfg.timing.clone(),
        };
        esc.power.set_level(!on_level)?;
        Ok(esc)
    }

    pub fn servo(&self) -> &AngularServo<P> {
        &self.servo
    }

    pub fn power(&self) -> &S {
        &self.power
    }

    pub fn neutral_throttle(&self) -> f64 {
        self.neutral_throttle
    }

    pub fn full_fwd_throttle(&self) -> f64 {
        self.servo.range().max_angle
    }

    pub fn full_rev_throttle(&self) -> f64 {
        self.servo.range().min_angle
    }

    ///Shifts non-neutral throttles past the dead zone, then clamps to the throttle range.
    pub fn fix_throttle(&self, throttle: f64) -> f64 {
        let shifted = if throttle > self.neutral_throttle {
            throttle + (self.min_fwd_throttle - 1.0)
        } else if throttle < self.neutral_throttle {
            throttle + (self.min_rev_throttle + 1.0)
        } else {
            throttle
        };
        self.servo.range().clamp(shifted)
    }

    ///Applies the dead zone correction and writes the throttle. Returns the throttle actually applied.
    pub fn set_throttle(&mut self, throttle: f64) -> Result<f64, ServoError> {
        if throttle.is_nan() {
            return Err(ServoError::range("throttle is NaN"));
        }
        self.set_throttle_raw(self.fix_throttle(throttle))
    }

    ///Writes the throttle with clamping only.
    pub fn set_throttle_raw(&mut self, throttle: f64) -> Result<f64, ServoError> {
        let applied = self.servo.range().clamp(throttle);
        self.servo.set_angle(applied)?;
        info!("Throttle: {} / \u{00B1}{}", applied, self.full_fwd_throttle());
        Ok(applied)
    }

    ///Throttle derived from the current pulse width, `None` while the signal is off.
    pub fn throttle(&self) -> Option<f64> {
        self.servo.angle()
    }

    pub fn turn_on(&mut self) -> Result<(), ServoError> {
        info!("powering on ESC");
        self.power.set_level(self.on_level)
    }

    pub fn turn_off(&mut self) -> Result<(), ServoError> {
        info!("powering off ESC");
        self.power.set_level(!self.on_level)
    }

    pub fn is_on(&self) -> bool {
        self.power.level() == self.on_level
    }

    ///Runs the calibration handshake: full throttle while powering up, then neutral. The ESC answers with two
    ///beeps and then a long beep. There is no feedback, the sequence is timed only.
    pub async fn calibrate(&mut self) -> Result<(), ServoError> {
        let timing = self.timing.clone();
        info!("calibrating ESC");
        self.turn_off()?;
        info!("setting max throttle");
        self.set_throttle(self.full_fwd_throttle())?;
        self.turn_on()?;
        sleep(Duration::from_millis(timing.hold_max_ms)).await;
        info!("should hear two beeps");
        sleep(Duration::from_millis(timing.beep_wait_ms)).await;
        info!("setting neutral throttle");
        self.set_throttle(self.neutral_throttle)?;
        info!("should hear long beep");
        sleep(Duration::from_millis(timing.hold_neutral_ms)).await;
        info!("ESC should be calibrated");
        self.startup_beeps(timing.startup_beep_ms).await;
        Ok(())
    }

    ///Normal power-up without calibration.
    pub async fn start(&mut self) -> Result<(), ServoError> {
        info!("ESC starting up");
        self.set_throttle(self.neutral_throttle)?;
        self.turn_on()?;
        info!("listen to the ESC beeps now");
        sleep(Duration::from_millis(self.timing.start_wait_ms)).await;
        self.startup_beeps(self.timing.start_wait_ms).await;
        Ok(())
    }

    async fn startup_beeps(&self, wait_ms: u64) {
        info!("first beeps: 3 for 3 cell battery, 4 for 4 cell");
        sleep(Duration::from_millis(wait_ms)).await;
        info!("second beeps: 1 for brake on, 2 for brake off");
        sleep(Duration::from_millis(wait_ms)).await;
        info!("ESC startup done");
    }

    ///Neutral throttle, then power off. Both writes are attempted even if the first fails.
    pub fn shutdown(&mut self) -> Result<(), ServoError> {
        debug!("shutting down ESC");
        let neutral = self.set_throttle(self.neutral_throttle).map(|_| ());
        let off = self.turn_off();
        neutral.and(off)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sim::{SimBoard, SimPowerSwitch, SimPulseOutput},
        Board,
    };

    fn esc_with(cfg: &EscConfig) -> Result<Esc<SimPulseOutput, SimPowerSwitch>, ServoError> {
        let mut board = SimBoard::new();
        let output = board.pulse_output(13)?;
        let power = board.power_switch(23, Level::Low)?;
        Esc::new(output, power, cfg)
    }

    fn esc() -> Esc<SimPulseOutput, SimPowerSwitch> {
        esc_with(&EscConfig::default()).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_fix_throttle() {
        let esc = esc();
        assert_eq!(esc.fix_throttle(0.0), 0.0);
        assert_eq!(esc.fix_throttle(200.0), 90.0);
        assert_eq!(esc.fix_throttle(-200.0), -90.0);
        assert!(close(esc.fix_throttle(1.0), 10.1));
        assert!(close(esc.fix_throttle(-1.0), -8.1));
        assert!(close(esc.fix_throttle(3.0), 12.1));
        assert_eq!(esc.fix_throttle(85.0), 90.0);
    }

    #[test]
    fn test_set_throttle_pulse_widths() {
        let mut esc = esc();
        assert_eq!(esc.set_throttle(0.0), Ok(0.0));
        assert_eq!(esc.servo().output().pulse_width(), 1500);
        esc.set_throttle(1.0).unwrap();
        assert_eq!(esc.servo().output().pulse_width(), 1556);
        esc.set_throttle(-1.0).unwrap();
        assert_eq!(esc.servo().output().pulse_width(), 1455);
        esc.set_throttle(1000.0).unwrap();
        assert_eq!(esc.servo().output().pulse_width(), 2000);
        assert_eq!(esc.throttle(), Some(90.0));
    }

    #[test]
    fn test_set_throttle_raw_skips_dead_zone() {
        let mut esc = esc();
        assert_eq!(esc.set_throttle_raw(1.0), Ok(1.0));
        assert_eq!(esc.set_throttle_raw(-120.0), Ok(-90.0));
        assert_eq!(esc.servo().output().pulse_width(), 1000);
    }

    #[test]
    fn test_power_relay() {
        let mut esc = esc();
        assert!(!esc.is_on());
        esc.turn_on().unwrap();
        assert!(esc.is_on());
        assert_eq!(esc.power().level(), Level::High);
        esc.turn_off().unwrap();
        assert!(!esc.is_on());
    }

    #[test]
    fn test_active_low_relay() {
        let cfg = EscConfig { power_on_level: 0, ..EscConfig::default() };
        let mut esc = esc_with(&cfg).unwrap();
        assert_eq!(esc.power().level(), Level::High);
        esc.turn_on().unwrap();
        assert_eq!(esc.power().level(), Level::Low);
        assert!(esc.is_on());
    }

    #[test]
    fn test_bad_configs() {
        let cfg = EscConfig { power_on_level: 2, ..EscConfig::default() };
        assert_eq!(esc_with(&cfg).err(), Some(ServoError::InvalidLevel(2)));

        let cfg = EscConfig { neutral_throttle: 95.0, ..EscConfig::default() };
        assert!(matches!(esc_with(&cfg), Err(ServoError::InvalidRange(_))));

        let cfg = EscConfig { full_rev_throttle: 90.0, full_fwd_throttle: -90.0, ..EscConfig::default() };
        assert!(matches!(esc_with(&cfg), Err(ServoError::InvalidRange(_))));

        let cfg = EscConfig { full_fwd_throttle: f64::INFINITY, ..EscConfig::default() };
        assert!(matches!(esc_with(&cfg), Err(ServoError::InvalidRange(_))));
    }

    #[test]
    fn test_shutdown() {
        let mut esc = esc();
        esc.turn_on().unwrap();
        esc.set_throttle(40.0).unwrap();
        esc.shutdown().unwrap();
        assert_eq!(esc.throttle(), Some(0.0));
        assert!(!esc.is_on());
    }

    #[tokio::test(start_paused = true)]
    async fn test_calibrate_sequence() {
        let mut esc = esc();
        let started = tokio::time::Instant::now();
        esc.calibrate().await.unwrap();

        assert_eq!(esc.servo().output().history(), &[2000, 1500]);
        assert_eq!(esc.power().history(), &[Level::Low, Level::Low, Level::Low, Level::High]);
        assert!(esc.is_on());
        assert_eq!(started.elapsed(), Duration::from_millis(7000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_sequence() {
        let mut esc = esc();
        esc.start().await.unwrap();
        assert_eq!(esc.servo().output().history(), &[1500]);
        assert!(esc.is_on());
    }
}
