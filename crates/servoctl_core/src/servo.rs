use serde::Deserialize;
use tracing::debug;

use crate::{error::ServoError, PulseOutput, MAX_SERVO_PULSE_US, MIN_SERVO_PULSE_US};

///Maps an angle range onto a pulse width range. Defaults match a Spektrum S605 (0..180 degrees, 650..2500 us).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServoRange {
    pub min_angle: f64,
    pub max_angle: f64,
    pub min_pulse_width_us: u32,
    pub max_pulse_width_us: u32,
}

impl Default for ServoRange {
    fn default() -> Self {
        Self {
            min_angle: 0.0,
            max_angle: 180.0,
            min_pulse_width_us: 650,
            max_pulse_width_us: 2500,
        }
    }
}

impl ServoRange {
    pub fn validate(&self) -> Result<(), ServoError> {
        if self.min_angle.is_nan() || self.max_angle.is_nan() || self.min_angle >= self.max_angle {
            return Err(ServoError::range("must have min_angle < max_angle and non NaN values"));
        }
        if !(self.max_angle - self.min_angle).is_finite() {
            return Err(ServoError::range("min_angle and max_angle must be finite with a finite span"));
        }
        if self.min_pulse_width_us >= self.max_pulse_width_us {
            return Err(ServoError::range("must have min_pulse_width_us < max_pulse_width_us"));
        }
        if self.min_pulse_width_us < MIN_SERVO_PULSE_US {
            return Err(ServoError::InvalidPulseWidth(self.min_pulse_width_us));
        }
        if self.max_pulse_width_us > MAX_SERVO_PULSE_US {
            return Err(ServoError::InvalidPulseWidth(self.max_pulse_width_us));
        }
        Ok(())
    }

    pub fn clamp(&self, angle: f64) -> f64 {
        angle.max(self.min_angle).min(self.max_angle)
    }

    pub fn mid_angle(&self) -> f64 {
        (self.min_angle + self.max_angle) / 2.0
    }

    ///Pulse width for `angle`, after clamping, rounded to the nearest microsecond.
    pub fn pulse_width_for(&self, angle: f64) -> u32 {
        let angle = self.clamp(angle);
        let pw_span = (self.max_pulse_width_us - self.min_pulse_width_us) as f64;
        let pulse = self.min_pulse_width_us as f64
            + (angle - self.min_angle) * pw_span / (self.max_angle - self.min_angle);
        pulse.round() as u32
    }

    ///Inverse of `pulse_width_for`. Widths outside the range map past the angle bounds.
    pub fn angle_for(&self, width_us: u32) -> f64 {
        let pw_span = (self.max_pulse_width_us - self.min_pulse_width_us) as f64;
        self.min_angle
            + (width_us as f64 - self.min_pulse_width_us as f64) * (self.max_angle - self.min_angle) / pw_span
    }

    ///Angle covered by one microsecond of pulse width, i.e. the best resolution the servo can be driven at.
    pub fn step(&self) -> f64 {
        (self.max_angle - self.min_angle) / (self.max_pulse_width_us - self.min_pulse_width_us) as f64
    }
}

///A servo addressed by angle. Out of range angles are clamped, never rejected.
#[derive(Debug)]
pub struct AngularServo<P> {
    output: P,
    range: ServoRange,
}

impl<P: PulseOutput> AngularServo<P> {
    pub fn new(output: P, range: ServoRange) -> Result<Self, ServoError> {
        range.validate()?;
        Ok(Self { output, range })
    }

    pub fn range(&self) -> &ServoRange {
        &self.range
    }

    pub fn output(&self) -> &P {
        &self.output
    }

    pub fn into_output(self) -> P {
        self.output
    }

    ///Clamps and writes `angle`. Returns the pulse width written.
    pub fn set_angle(&mut self, angle: f64) -> Result<u32, ServoError> {
        if angle.is_nan() {
            return Err(ServoError::range("angle is NaN"));
        }
        let width = self.range.pulse_width_for(angle);
        debug!("pin {}: angle {} -> pulse width {}us", self.output.pin(), angle, width);
        self.output.set_pulse_width(width)?;
        Ok(width)
    }

    ///Angle derived from the current pulse width, `None` while the signal is off.
    pub fn angle(&self) -> Option<f64> {
        match self.output.pulse_width() {
            0 => None,
            width => Some(self.range.angle_for(width)),
        }
    }

    pub fn min(&mut self) -> Result<u32, ServoError> {
        self.set_angle(self.range.min_angle)
    }

    pub fn mid(&mut self) -> Result<u32, ServoError> {
        self.set_angle(self.range.mid_angle())
    }

    pub fn max(&mut self) -> Result<u32, ServoError> {
        self.set_angle(self.range.max_angle)
    }

    ///Stops the pulse train. The servo goes limp.
    pub fn detach(&mut self) -> Result<(), ServoError> {
        self.output.set_pulse_width(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sim::{SimBoard, SimPulseOutput}, Board};

    fn rudder() -> AngularServo<SimPulseOutput> {
        let output = SimBoard::new().pulse_output(18).unwrap();
        AngularServo::new(output, ServoRange::default()).unwrap()
    }

    #[test]
    fn test_mid_angle_pulse_width() {
        let mut servo = rudder();
        assert_eq!(servo.set_angle(90.0), Ok(1575));
        assert_eq!(servo.output().pulse_width(), 1575);
        assert_eq!(servo.set_angle(0.0), Ok(650));
        assert_eq!(servo.set_angle(180.0), Ok(2500));
    }

    #[test]
    fn test_out_of_range_angles_clamp() {
        let mut servo = rudder();
        let at_min = servo.set_angle(0.0).unwrap();
        assert_eq!(servo.set_angle(-10.0), Ok(at_min));
        let at_max = servo.set_angle(180.0).unwrap();
        assert_eq!(servo.set_angle(500.0), Ok(at_max));
        assert_eq!(servo.angle(), Some(180.0));
    }

    #[test]
    fn test_angle_round_trip() {
        let mut servo = rudder();
        let step = servo.range().step();
        let mut angle = 0.0;
        while angle <= 180.0 {
            servo.set_angle(angle).unwrap();
            let back = servo.angle().unwrap();
            assert!((back - angle).abs() <= step, "angle {} read back as {}", angle, back);
            angle += 0.7;
        }
    }

    #[test]
    fn test_detach_and_helpers() {
        let mut servo = rudder();
        assert_eq!(servo.angle(), None);
        servo.mid().unwrap();
        assert_eq!(servo.angle(), Some(90.0));
        servo.min().unwrap();
        servo.max().unwrap();
        servo.detach().unwrap();
        assert_eq!(servo.angle(), None);
        assert_eq!(servo.into_output().history(), &[1575, 650, 2500, 0]);
    }

    #[test]
    fn test_nan_angle_is_rejected() {
        let mut servo = rudder();
        assert!(matches!(servo.set_angle(f64::NAN), Err(ServoError::InvalidRange(_))));
        assert!(servo.output().history().is_empty());
    }

    #[test]
    fn test_bad_ranges() {
        let mut board = SimBoard::new();
        let inverted = ServoRange { min_angle: 90.0, max_angle: 0.0, ..ServoRange::default() };
        let output = board.pulse_output(18).unwrap();
        assert!(matches!(AngularServo::new(output, inverted), Err(ServoError::InvalidRange(_))));

        let too_wide = ServoRange { max_pulse_width_us: 3000, ..ServoRange::default() };
        let output = board.pulse_output(19).unwrap();
        assert_eq!(
            AngularServo::new(output, too_wide).unwrap_err(),
            ServoError::InvalidPulseWidth(3000)
        );

        let unbounded = ServoRange { min_angle: f64::NEG_INFINITY, ..ServoRange::default() };
        let output = board.pulse_output(20).unwrap();
        assert!(matches!(AngularServo::new(output, unbounded), Err(ServoError::InvalidRange(_))));

        let overflowing = ServoRange { min_angle: -f64::MAX, max_angle: f64::MAX, ..ServoRange::default() };
        let output = board.pulse_output(21).unwrap();
        assert!(matches!(AngularServo::new(output, overflowing), Err(ServoError::InvalidRange(_))));
    }
}
