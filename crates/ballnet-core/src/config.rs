//! Pipeline settings and the variant manifest.
//!
//! A manifest is a JSON document listing the body variants a process serves:
//!
//! ```json
//! {
//!   "pipeline": {
//!     "color_range": { "min": 0.0, "max": 12.0 },
//!     "frame_correction": { "kind": "rotate_x_neg90" },
//!     "colormap": { "kind": "viridis" }
//!   },
//!   "variants": [
//!     {
//!       "name": "BallNet",
//!       "assets": { "dir": "assets/ball" },
//!       "model": { "kind": "subprocess", "model": "models/ballnet.onnx" }
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the manifest's directory. The manifest-wide
//! settings are checked when the manifest loads. A variant's `pipeline`
//! override is checked when that variant is built, so a bad override disables
//! only its own variant.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::AssetFiles;
use crate::error::{ConfigError, ConfigResult};
use crate::geometry::Vec3;
use crate::motion::MotionLimits;

/// Environment variable overriding the manifest path.
pub const CONFIG_ENV_VAR: &str = "BALLNET_CONFIG";

/// Default manifest file name.
pub const DEFAULT_MANIFEST_FILE: &str = "ballnet.json";

/// Default lower bound of the displacement color scale.
pub const DEFAULT_COLOR_MIN: f32 = 0.0;

/// Default upper bound of the displacement color scale.
pub const DEFAULT_COLOR_MAX: f32 = 12.0;

/// Closed displacement-magnitude interval mapped onto the colormap.
///
/// Guaranteed finite with `min < max`, so normalization never divides by
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorRange {
    min: f32,
    max: f32,
}

impl ColorRange {
    /// Creates a color range, rejecting empty, inverted or non-finite bounds.
    pub fn new(min: f32, max: f32) -> ConfigResult<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(ConfigError::color_range(min, max, "bounds must be finite"));
        }
        if min == max {
            return Err(ConfigError::color_range(min, max, "bounds must differ"));
        }
        if min > max {
            return Err(ConfigError::color_range(min, max, "min exceeds max"));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Clips `magnitude` to the range and maps it onto `[0, 1]`.
    pub fn normalize(&self, magnitude: f32) -> f32 {
        let clamped = magnitude.clamp(self.min, self.max);
        (clamped - self.min) / (self.max - self.min)
    }
}

impl Default for ColorRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_COLOR_MIN,
            max: DEFAULT_COLOR_MAX,
        }
    }
}

/// Color range bounds as written in a manifest, not yet checked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorBounds {
    pub min: f32,
    pub max: f32,
}

impl ColorBounds {
    /// Checks the bounds and builds the range.
    pub fn to_range(&self) -> ConfigResult<ColorRange> {
        ColorRange::new(self.min, self.max)
    }
}

impl Default for ColorBounds {
    fn default() -> Self {
        ColorRange::default().into()
    }
}

impl From<ColorRange> for ColorBounds {
    fn from(range: ColorRange) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

/// Rotation applied to deformed positions to move them from the model's
/// training frame into the rendering frame.
///
/// The correction assumes displacements are predicted in the model frame:
/// they are added to the reference positions first and the sum is rotated.
/// A model trained directly in the render frame should use `Identity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameCorrection {
    /// -90 degrees about X: `(x, y, z) -> (x, z, -y)`.
    RotateXNeg90,
    /// No correction.
    Identity,
    /// Arbitrary row-major matrix, applied as `M * v`.
    Matrix { rows: [[f32; 3]; 3] },
}

impl Default for FrameCorrection {
    fn default() -> Self {
        FrameCorrection::RotateXNeg90
    }
}

impl FrameCorrection {
    /// Row-major matrix of the correction.
    pub fn matrix(&self) -> [[f32; 3]; 3] {
        match self {
            FrameCorrection::RotateXNeg90 => [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]],
            FrameCorrection::Identity => [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            FrameCorrection::Matrix { rows } => *rows,
        }
    }

    /// Applies the correction to one point.
    #[inline]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let m = self.matrix();
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }

    /// Returns true if the correction leaves points unchanged.
    pub fn is_identity(&self) -> bool {
        self.matrix() == FrameCorrection::Identity.matrix()
    }

    /// Rejects matrices with non-finite entries or a vanishing determinant.
    pub fn validate(&self) -> ConfigResult<()> {
        let m = self.matrix();
        if m.iter().flatten().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidFrameCorrection(
                "entries must be finite".to_string(),
            ));
        }
        let det = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);
        if det.abs() < 1e-6 {
            return Err(ConfigError::InvalidFrameCorrection(format!(
                "matrix is singular (determinant {})",
                det
            )));
        }
        Ok(())
    }
}

/// Colormap selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColormapSpec {
    /// The perceptually uniform viridis scale.
    #[default]
    Viridis,
    /// Evenly spaced RGB stops in `[0, 1]`, interpolated linearly.
    Stops { stops: Vec<[f32; 3]> },
}

/// Settings shared by every prediction of a variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineSettings {
    #[serde(default)]
    pub color_range: ColorBounds,
    #[serde(default)]
    pub frame_correction: FrameCorrection,
    #[serde(default)]
    pub colormap: ColormapSpec,
}

impl PipelineSettings {
    /// Checks the color range and the frame correction.
    pub fn validate(&self) -> ConfigResult<()> {
        self.color_range.to_range()?;
        self.frame_correction.validate()
    }
}

/// Default timeout for a subprocess model run, in seconds.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 60;

fn default_timeout_secs() -> u64 {
    DEFAULT_MODEL_TIMEOUT_SECS
}

fn default_input_name() -> String {
    "motion".to_string()
}

/// How a variant's predictive model is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelDescriptor {
    /// Affine surrogate model stored as JSON weights.
    Linear { path: PathBuf },
    /// External runner process evaluating a model file.
    Subprocess {
        /// Model file handed to the runner (e.g. an ONNX graph).
        model: PathBuf,
        /// Interpreter used to run the script.
        #[serde(default)]
        interpreter: Option<PathBuf>,
        /// Runner script; the bundled script is used when absent.
        #[serde(default)]
        runner: Option<PathBuf>,
        /// Name of the model's motion input.
        #[serde(default = "default_input_name")]
        input_name: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl ModelDescriptor {
    /// Returns the string identifier of the model kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelDescriptor::Linear { .. } => "linear",
            ModelDescriptor::Subprocess { .. } => "subprocess",
        }
    }

    /// Resolves relative paths against `base`.
    pub fn resolved(&self, base: &Path) -> Self {
        let join = |p: &PathBuf| if p.is_relative() { base.join(p) } else { p.clone() };
        match self {
            ModelDescriptor::Linear { path } => ModelDescriptor::Linear { path: join(path) },
            ModelDescriptor::Subprocess {
                model,
                interpreter,
                runner,
                input_name,
                timeout_secs,
            } => ModelDescriptor::Subprocess {
                model: join(model),
                interpreter: interpreter.clone(),
                runner: runner.as_ref().map(join),
                input_name: input_name.clone(),
                timeout_secs: *timeout_secs,
            },
        }
    }
}

/// One body variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub name: String,
    pub assets: AssetFiles,
    pub model: ModelDescriptor,
    /// Overrides the manifest-wide pipeline settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineSettings>,
}

/// The list of variants a process serves, with shared settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub pipeline: PipelineSettings,
    #[serde(default)]
    pub motion_limits: MotionLimits,
    pub variants: Vec<VariantConfig>,
    /// Directory relative paths resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Manifest {
    /// Parses a manifest from JSON text. Relative paths resolve against
    /// `base_dir`.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let mut manifest: Manifest =
            serde_json::from_str(json).map_err(|source| ConfigError::ParseManifest {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        manifest.base_dir = base_dir.into();
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads a manifest file.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadManifest {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest: Manifest =
            serde_json::from_str(&text).map_err(|source| ConfigError::ParseManifest {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        manifest.validate()?;
        Ok(manifest)
    }

    /// Locates the manifest: explicit path, then `BALLNET_CONFIG`, then
    /// `ballnet.json` in the working directory.
    pub fn locate(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(path);
        }
        PathBuf::from(DEFAULT_MANIFEST_FILE)
    }

    /// Checks manifest-level invariants.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.variants.is_empty() {
            return Err(ConfigError::NoVariants);
        }
        let mut names = HashSet::new();
        for variant in &self.variants {
            if !names.insert(variant.name.as_str()) {
                return Err(ConfigError::DuplicateVariant(variant.name.clone()));
            }
        }
        self.motion_limits.validate()?;
        self.pipeline.validate()
    }

    /// Effective pipeline settings of a variant.
    pub fn settings_for<'a>(&'a self, variant: &'a VariantConfig) -> &'a PipelineSettings {
        variant.pipeline.as_ref().unwrap_or(&self.pipeline)
    }

    /// Looks up a variant by name.
    pub fn variant(&self, name: &str) -> Option<&VariantConfig> {
        self.variants.iter().find(|v| v.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CodedError;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
        "pipeline": {
            "color_range": { "min": 0.0, "max": 12.0 },
            "frame_correction": { "kind": "rotate_x_neg90" }
        },
        "variants": [
            {
                "name": "BallNet",
                "assets": { "dir": "assets/ball" },
                "model": { "kind": "linear", "path": "models/ballnet.json" }
            },
            {
                "name": "FlatNet",
                "assets": { "dir": "assets/flat", "node_index_base": 0 },
                "model": { "kind": "subprocess", "model": "models/flat.onnx", "timeout_secs": 5 },
                "pipeline": { "frame_correction": { "kind": "identity" } }
            }
        ]
    }"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_json(MANIFEST, "/srv").unwrap();
        assert_eq!(manifest.variants.len(), 2);
        assert_eq!(manifest.base_dir, PathBuf::from("/srv"));

        let ball = manifest.variant("BallNet").unwrap();
        assert_eq!(ball.assets.vertices, "surface_coordinate.txt");
        assert_eq!(ball.assets.face_index_base, 1);
        assert_eq!(
            manifest.settings_for(ball).frame_correction,
            FrameCorrection::RotateXNeg90
        );

        let flat = manifest.variant("FlatNet").unwrap();
        assert_eq!(flat.assets.node_index_base, 0);
        assert_eq!(
            manifest.settings_for(flat).frame_correction,
            FrameCorrection::Identity
        );
        assert_eq!(manifest.settings_for(flat).color_range, ColorBounds::default());
        match &flat.model {
            ModelDescriptor::Subprocess {
                input_name,
                timeout_secs,
                ..
            } => {
                assert_eq!(input_name, "motion");
                assert_eq!(*timeout_secs, 5);
            }
            other => panic!("unexpected model {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_color_range_rejected_at_load() {
        let json = r#"{
            "pipeline": { "color_range": { "min": 3.0, "max": 3.0 } },
            "variants": [
                { "name": "A", "assets": { "dir": "a" }, "model": { "kind": "linear", "path": "a.json" } }
            ]
        }"#;
        let err = Manifest::from_json(json, ".").unwrap_err();
        assert_eq!(err.code(), "CONFIG_001");
        assert!(err.to_string().contains("bounds must differ"), "{}", err);
    }

    #[test]
    fn test_variant_override_checked_later() {
        let json = r#"{ "variants": [
            { "name": "Good", "assets": { "dir": "a" }, "model": { "kind": "linear", "path": "a.json" } },
            {
                "name": "Bad",
                "assets": { "dir": "b" },
                "model": { "kind": "linear", "path": "b.json" },
                "pipeline": {
                    "color_range": { "min": 3.0, "max": 3.0 },
                    "frame_correction": { "kind": "matrix", "rows": [[1, 0, 0], [0, 0, 0], [0, 0, 1]] }
                }
            }
        ] }"#;
        let manifest = Manifest::from_json(json, ".").unwrap();
        let bad = manifest.variant("Bad").unwrap();
        let err = manifest.settings_for(bad).validate().unwrap_err();
        assert_eq!(err.code(), "CONFIG_001");
        let good = manifest.variant("Good").unwrap();
        manifest.settings_for(good).validate().unwrap();
    }

    #[test]
    fn test_color_range_validation() {
        assert!(ColorRange::new(0.0, 12.0).is_ok());
        assert!(ColorRange::new(1.0, 1.0).is_err());
        assert!(ColorRange::new(2.0, 1.0).is_err());
        assert!(ColorRange::new(0.0, f32::INFINITY).is_err());
    }

    #[test]
    fn test_color_range_normalize_clips() {
        let range = ColorRange::default();
        assert_eq!(range.normalize(-1.0), 0.0);
        assert_eq!(range.normalize(0.0), 0.0);
        assert_eq!(range.normalize(6.0), 0.5);
        assert_eq!(range.normalize(12.0), 1.0);
        assert_eq!(range.normalize(40.0), 1.0);
    }

    #[test]
    fn test_frame_correction_rotates_minus_90_about_x() {
        let frame = FrameCorrection::RotateXNeg90;
        assert_eq!(frame.apply([1.0, 2.0, 3.0]), [1.0, 3.0, -2.0]);
        assert!(!frame.is_identity());
        assert!(FrameCorrection::Identity.is_identity());
        frame.validate().unwrap();
    }

    #[test]
    fn test_singular_matrix_rejected() {
        let frame = FrameCorrection::Matrix {
            rows: [[1.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
        };
        assert!(frame.validate().is_err());
    }

    #[test]
    fn test_empty_and_duplicate_variants() {
        let err = Manifest::from_json(r#"{ "variants": [] }"#, ".").unwrap_err();
        assert!(matches!(err, ConfigError::NoVariants));

        let json = r#"{ "variants": [
            { "name": "A", "assets": { "dir": "a" }, "model": { "kind": "linear", "path": "a.json" } },
            { "name": "A", "assets": { "dir": "b" }, "model": { "kind": "linear", "path": "b.json" } }
        ] }"#;
        let err = Manifest::from_json(json, ".").unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariant(name) if name == "A"));
    }

    #[test]
    fn test_model_descriptor_resolved() {
        let model = ModelDescriptor::Linear {
            path: PathBuf::from("models/m.json"),
        };
        assert_eq!(
            model.resolved(Path::new("/srv")),
            ModelDescriptor::Linear {
                path: PathBuf::from("/srv/models/m.json")
            }
        );
        assert_eq!(model.kind(), "linear");
    }
}
