//! Motion commands, model inputs and force results.
//!
//! Units are part of the public contract: translations in millimeters,
//! rotations in degrees, forces in Newtons and torques in Newton-millimeters.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult, MotionError, MotionResult};

/// Component names in motion-vector order.
pub const MOTION_COMPONENTS: [&str; 6] = ["dx", "dy", "dz", "rx", "ry", "rz"];

/// Column labels for a force result, in force-vector order.
pub const FORCE_LABELS: [&str; 6] = [
    "Fx (N)", "Fy (N)", "Fz (N)", "Tx (Nmm)", "Ty (Nmm)", "Tz (Nmm)",
];

/// A rigid 6-DOF motion applied to the deformable body.
///
/// Translations are in millimeters, rotations in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionCommand {
    /// Translation along X (mm).
    pub dx: f64,
    /// Translation along Y (mm).
    pub dy: f64,
    /// Translation along Z (mm).
    pub dz: f64,
    /// Rotation about X (degrees).
    pub rx: f64,
    /// Rotation about Y (degrees).
    pub ry: f64,
    /// Rotation about Z (degrees).
    pub rz: f64,
}

impl MotionCommand {
    /// Creates a motion command, rejecting non-finite components.
    pub fn new(dx: f64, dy: f64, dz: f64, rx: f64, ry: f64, rz: f64) -> MotionResult<Self> {
        let motion = Self {
            dx,
            dy,
            dz,
            rx,
            ry,
            rz,
        };
        motion.validate()?;
        Ok(motion)
    }

    /// The zero motion.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds a motion from an untyped vector. The slice must hold exactly six
    /// finite values in `(dx, dy, dz, rx, ry, rz)` order.
    pub fn from_slice(values: &[f64]) -> MotionResult<Self> {
        match values {
            [dx, dy, dz, rx, ry, rz] => Self::new(*dx, *dy, *dz, *rx, *ry, *rz),
            _ => Err(MotionError::WrongArity(values.len())),
        }
    }

    /// Parses a comma-separated `dx,dy,dz,rx,ry,rz` string.
    pub fn parse_csv(text: &str) -> MotionResult<Self> {
        let values = text
            .split(',')
            .map(str::trim)
            .enumerate()
            .map(|(position, part)| {
                part.parse::<f64>().map_err(|_| MotionError::NotANumber {
                    position,
                    text: part.to_string(),
                })
            })
            .collect::<MotionResult<Vec<f64>>>()?;
        Self::from_slice(&values)
    }

    /// Components in `(dx, dy, dz, rx, ry, rz)` order.
    pub fn to_array(&self) -> [f64; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Checks that every component is finite.
    pub fn validate(&self) -> MotionResult<()> {
        for (name, value) in MOTION_COMPONENTS.iter().zip(self.to_array()) {
            if !value.is_finite() {
                return Err(MotionError::NonFinite { name: *name, value });
            }
        }
        Ok(())
    }

    /// Converts to the model's input vector, with rotations in radians.
    pub fn to_model_input(&self) -> ModelInput {
        ModelInput([
            self.dx as f32,
            self.dy as f32,
            self.dz as f32,
            self.rx.to_radians() as f32,
            self.ry.to_radians() as f32,
            self.rz.to_radians() as f32,
        ])
    }
}

/// The six-value vector handed to an inference adapter:
/// `(dx, dy, dz, rx_rad, ry_rad, rz_rad)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelInput(pub [f32; 6]);

impl ModelInput {
    /// Values as a slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Predicted reaction force and torque.
///
/// Forces are in Newtons, torques in Newton-millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ForceResult {
    #[serde(rename = "Fx")]
    pub fx: f64,
    #[serde(rename = "Fy")]
    pub fy: f64,
    #[serde(rename = "Fz")]
    pub fz: f64,
    #[serde(rename = "Tx")]
    pub tx: f64,
    #[serde(rename = "Ty")]
    pub ty: f64,
    #[serde(rename = "Tz")]
    pub tz: f64,
}

impl ForceResult {
    /// Builds a force result from a flat 6-vector.
    pub fn from_array(values: [f64; 6]) -> Self {
        let [fx, fy, fz, tx, ty, tz] = values;
        Self {
            fx,
            fy,
            fz,
            tx,
            ty,
            tz,
        }
    }

    /// Components in `(Fx, Fy, Fz, Tx, Ty, Tz)` order.
    pub fn to_array(&self) -> [f64; 6] {
        [self.fx, self.fy, self.fz, self.tx, self.ty, self.tz]
    }

    /// Each component formatted with three decimal places.
    pub fn formatted(&self) -> [String; 6] {
        self.to_array().map(|v| format!("{:.3}", v))
    }

    /// Magnitude of the force part.
    pub fn force_magnitude(&self) -> f64 {
        (self.fx * self.fx + self.fy * self.fy + self.fz * self.fz).sqrt()
    }
}

impl std::fmt::Display for ForceResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = FORCE_LABELS
            .iter()
            .zip(self.formatted())
            .map(|(label, value)| format!("{} = {}", label, value))
            .collect();
        f.write_str(&parts.join(", "))
    }
}

/// Closed interval for one motion component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Creates a symmetric interval `[-half, half]`.
    pub fn symmetric(half: f64) -> Self {
        Self {
            min: -half,
            max: half,
        }
    }

    /// Returns true if `value` lies inside the interval.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// The envelope of motions the model was trained on.
///
/// Motions outside the envelope are still predicted; callers receive
/// warnings so extrapolated results can be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionLimits {
    pub dx: Interval,
    pub dy: Interval,
    pub dz: Interval,
    pub rx: Interval,
    pub ry: Interval,
    pub rz: Interval,
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self {
            dx: Interval::symmetric(10.0),
            dy: Interval::symmetric(10.0),
            dz: Interval::symmetric(3.0),
            rx: Interval::symmetric(30.0),
            ry: Interval::symmetric(30.0),
            rz: Interval::symmetric(30.0),
        }
    }
}

/// A motion component that falls outside the trained envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvelopeWarning {
    pub component: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl std::fmt::Display for EnvelopeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} = {} is outside the trained range [{}, {}]",
            self.component, self.value, self.min, self.max
        )
    }
}

impl MotionLimits {
    fn intervals(&self) -> [Interval; 6] {
        [self.dx, self.dy, self.dz, self.rx, self.ry, self.rz]
    }

    /// Checks that every interval is finite and non-empty.
    pub fn validate(&self) -> ConfigResult<()> {
        for (name, interval) in MOTION_COMPONENTS.iter().zip(self.intervals()) {
            if !interval.min.is_finite() || !interval.max.is_finite() {
                return Err(ConfigError::InvalidMotionLimits(format!(
                    "{} bounds must be finite",
                    name
                )));
            }
            if interval.min > interval.max {
                return Err(ConfigError::InvalidMotionLimits(format!(
                    "{} minimum {} exceeds maximum {}",
                    name, interval.min, interval.max
                )));
            }
        }
        Ok(())
    }

    /// Lists the components of `motion` outside the envelope.
    pub fn check(&self, motion: &MotionCommand) -> Vec<EnvelopeWarning> {
        MOTION_COMPONENTS
            .iter()
            .zip(self.intervals())
            .zip(motion.to_array())
            .filter(|((_, interval), value)| !interval.contains(*value))
            .map(|((component, interval), value)| EnvelopeWarning {
                component: *component,
                value,
                min: interval.min,
                max: interval.max,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_input_converts_degrees() {
        let motion = MotionCommand::new(1.0, -2.0, 0.5, 180.0, -90.0, 0.0).unwrap();
        let input = motion.to_model_input();
        assert_eq!(input.0[0], 1.0);
        assert_eq!(input.0[1], -2.0);
        assert_eq!(input.0[2], 0.5);
        assert!((input.0[3] - std::f32::consts::PI).abs() < 1e-6);
        assert!((input.0[4] + std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert_eq!(input.0[5], 0.0);
    }

    #[test]
    fn test_from_slice_rejects_wrong_arity() {
        assert_eq!(
            MotionCommand::from_slice(&[0.0; 5]),
            Err(MotionError::WrongArity(5))
        );
        assert_eq!(
            MotionCommand::from_slice(&[0.0; 7]),
            Err(MotionError::WrongArity(7))
        );
        assert!(MotionCommand::from_slice(&[0.0; 6]).is_ok());
    }

    #[test]
    fn test_rejects_non_finite() {
        let err = MotionCommand::new(0.0, f64::NAN, 0.0, 0.0, 0.0, 0.0).unwrap_err();
        assert!(matches!(err, MotionError::NonFinite { name: "dy", .. }));
    }

    #[test]
    fn test_parse_csv() {
        let motion = MotionCommand::parse_csv("1, 2,3 ,4,5,6").unwrap();
        assert_eq!(motion.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let err = MotionCommand::parse_csv("1,2,x,4,5,6").unwrap_err();
        assert!(matches!(err, MotionError::NotANumber { position: 2, .. }));

        let err = MotionCommand::parse_csv("1,2,3").unwrap_err();
        assert_eq!(err, MotionError::WrongArity(3));
    }

    #[test]
    fn test_force_formatting() {
        let force = ForceResult::from_array([1.23456, -0.0004, 2.0, 10.5, 0.0, -3.14159]);
        assert_eq!(
            force.formatted(),
            ["1.235", "-0.000", "2.000", "10.500", "0.000", "-3.142"].map(String::from)
        );
        assert!(force.to_string().starts_with("Fx (N) = 1.235"));
    }

    #[test]
    fn test_motion_limits_check() {
        let limits = MotionLimits::default();
        limits.validate().unwrap();
        assert!(limits.check(&MotionCommand::zero()).is_empty());

        let motion = MotionCommand::new(0.0, 0.0, 4.0, 0.0, 45.0, 0.0).unwrap();
        let warnings = limits.check(&motion);
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].component, "dz");
        assert_eq!(warnings[1].component, "ry");
    }

    #[test]
    fn test_motion_limits_validate() {
        let mut limits = MotionLimits::default();
        limits.rz = Interval { min: 5.0, max: -5.0 };
        assert!(limits.validate().is_err());
    }
}
