//! JSON output types for machine-readable CLI output.
//!
//! Every command accepts `--json`; the structures here are what it prints.

use ballnet_core::{BoundingBox, CodedError, ForceResult};
use ballnet_pipeline::VariantStatus;
use serde::{Deserialize, Serialize};

/// Error codes for CLI-level failures. Library failures pass their own codes
/// through.
pub mod error_codes {
    /// No ready variant to predict with
    pub const NO_VARIANT: &str = "CLI_001";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "CLI_001", "ASSET_003")
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Wraps a coded library error.
    pub fn from_coded(err: &dyn CodedError) -> Self {
        Self::new(err.code(), err.message())
    }
}

/// Mesh summary in `predict` output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeshSummary {
    /// Path of the written GLB file
    pub path: String,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Bounds of the deformed positions, in the render frame
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

/// Output of `predict --json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictOutput {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<ForceResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshSummary>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
}

impl PredictOutput {
    /// A failed prediction.
    pub fn failure(error: JsonError) -> Self {
        Self {
            success: false,
            variant: None,
            force: None,
            mesh: None,
            warnings: Vec::new(),
            errors: vec![error],
        }
    }
}

/// Output of `inspect --json`.
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutput {
    pub success: bool,
    pub manifest: String,
    pub variants: Vec<VariantStatus>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
}

/// One `doctor` check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorCheck {
    pub name: String,
    pub ok: bool,
    /// A failed check that does not fail the run.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub warning: bool,
    pub detail: String,
}

/// Output of `doctor --json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorOutput {
    pub success: bool,
    pub checks: Vec<DoctorCheck>,
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballnet_core::MotionError;

    #[test]
    fn test_failure_output_shape() {
        let output = PredictOutput::failure(JsonError::from_coded(&MotionError::WrongArity(5)));
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["code"], "MOTION_001");
        assert!(json.get("force").is_none());
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_force_serializes_with_component_names() {
        let output = PredictOutput {
            success: true,
            variant: Some("BallNet".into()),
            force: Some(ForceResult::from_array([1.0, 2.0, 3.0, 4.0, 5.0, 6.0])),
            mesh: None,
            warnings: vec![],
            errors: vec![],
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["force"]["Fx"], 1.0);
        assert_eq!(json["force"]["Tz"], 6.0);
    }
}
