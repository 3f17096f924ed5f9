//! Error types for the pipeline, model adapters and export.

use std::path::PathBuf;

use ballnet_core::{AssetError, CodedError, ConfigError, IntegrityError, MotionError};
use thiserror::Error;

/// Result type for inference operations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Errors raised by an inference adapter.
///
/// A failed evaluation fails the prediction; no default output is
/// substituted.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No interpreter to run the model runner.
    #[error("Model runner interpreter not found. Install python3 or set the BALLNET_PYTHON environment variable")]
    InterpreterNotFound,

    /// Runner script not found.
    #[error("Model runner script not found at: {path}")]
    RunnerNotFound { path: PathBuf },

    /// Model file not found.
    #[error("Model file not found at: {path}")]
    ModelNotFound { path: PathBuf },

    /// Failed to spawn the runner process.
    #[error("Failed to spawn model runner: {0}")]
    SpawnFailed(#[source] std::io::Error),

    /// Runner did not finish in time.
    #[error("Model runner timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Runner exited with non-zero status.
    #[error("Model runner exited with status {exit_code}: {stderr}")]
    ProcessFailed { exit_code: i32, stderr: String },

    /// Failed to write the runner request.
    #[error("Failed to write model request: {0}")]
    WriteRequestFailed(#[source] std::io::Error),

    /// Failed to read the runner response.
    #[error("Failed to read model response from {path}: {source}")]
    ReadResponseFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Runner response is not valid JSON.
    #[error("Failed to parse model response: {0}")]
    ParseResponseFailed(#[source] serde_json::Error),

    /// The runner reported an evaluation error.
    #[error("Model evaluation failed: {message}")]
    EvaluationFailed { message: String },

    /// Failed to read a model file.
    #[error("Failed to read model {path}: {source}")]
    ReadModel {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Model file is not valid.
    #[error("Failed to parse model {path}: {source}")]
    ParseModel {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An output or weight array has the wrong shape.
    #[error("{what} has the wrong shape: expected {expected}, found {found} values")]
    InvalidShape {
        what: &'static str,
        expected: String,
        found: usize,
    },

    /// The model produced NaN or infinite values.
    #[error("{what} contains non-finite values")]
    NonFinite { what: &'static str },

    /// The model's node count disagrees with the variant's deformable nodes.
    #[error("model produced {found} node displacements, but the variant has {expected} deformable nodes")]
    NodeCountMismatch { expected: usize, found: usize },

    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    /// Creates a new process failed error.
    pub fn process_failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessFailed {
            exit_code,
            stderr: stderr.into(),
        }
    }

    /// Creates a new evaluation failed error.
    pub fn evaluation_failed(message: impl Into<String>) -> Self {
        Self::EvaluationFailed {
            message: message.into(),
        }
    }

    /// Creates a new shape error.
    pub fn invalid_shape(what: &'static str, expected: impl Into<String>, found: usize) -> Self {
        Self::InvalidShape {
            what,
            expected: expected.into(),
            found,
        }
    }
}

impl CodedError for InferenceError {
    fn code(&self) -> &'static str {
        match self {
            InferenceError::InterpreterNotFound => "INFER_001",
            InferenceError::RunnerNotFound { .. } => "INFER_002",
            InferenceError::ModelNotFound { .. } => "INFER_003",
            InferenceError::SpawnFailed(_) => "INFER_004",
            InferenceError::Timeout { .. } => "INFER_005",
            InferenceError::ProcessFailed { .. } => "INFER_006",
            InferenceError::WriteRequestFailed(_) => "INFER_007",
            InferenceError::ReadResponseFailed { .. } => "INFER_008",
            InferenceError::ParseResponseFailed(_) => "INFER_009",
            InferenceError::EvaluationFailed { .. } => "INFER_010",
            InferenceError::ReadModel { .. } => "INFER_011",
            InferenceError::ParseModel { .. } => "INFER_012",
            InferenceError::InvalidShape { .. } => "INFER_013",
            InferenceError::NonFinite { .. } => "INFER_014",
            InferenceError::NodeCountMismatch { .. } => "INFER_015",
            InferenceError::Io(_) => "INFER_016",
        }
    }

    fn category(&self) -> &'static str {
        "inference"
    }
}

/// Result type for GLB export.
pub type ExportResult<T> = Result<T, ExportError>;

/// Errors raised while serializing a mesh.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The mesh has no triangles.
    #[error("cannot export a mesh with no triangles")]
    EmptyMesh,

    /// The GLB would exceed the 4 GiB container limit.
    #[error("GLB of {bytes} bytes exceeds the 32-bit length field")]
    TooLarge { bytes: usize },

    /// Failed to serialize the glTF JSON chunk.
    #[error("Failed to serialize glTF JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Failed to write the output file.
    #[error("Failed to write GLB to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodedError for ExportError {
    fn code(&self) -> &'static str {
        match self {
            ExportError::EmptyMesh => "EXPORT_001",
            ExportError::TooLarge { .. } => "EXPORT_002",
            ExportError::Serialize(_) => "EXPORT_003",
            ExportError::Write { .. } => "EXPORT_004",
        }
    }

    fn category(&self) -> &'static str {
        "export"
    }
}

/// Result type for variant initialization.
pub type VariantResult<T> = Result<T, VariantError>;

/// Errors that disable a variant at initialization.
#[derive(Debug, Error)]
pub enum VariantError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl CodedError for VariantError {
    fn code(&self) -> &'static str {
        match self {
            VariantError::Asset(e) => e.code(),
            VariantError::Config(e) => e.code(),
            VariantError::Inference(e) => e.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            VariantError::Asset(e) => e.category(),
            VariantError::Config(e) => e.category(),
            VariantError::Inference(e) => e.category(),
        }
    }
}

/// Result type for predictions.
pub type PredictResult<T> = Result<T, PredictError>;

/// Errors returned by `predict`.
#[derive(Debug, Error)]
pub enum PredictError {
    /// The motion command was rejected before reaching the model.
    #[error("invalid motion: {0}")]
    InvalidMotion(#[from] MotionError),

    /// No variant with this name is configured.
    #[error("unknown variant '{name}'")]
    UnknownVariant { name: String },

    /// The variant failed to initialize.
    #[error("variant '{name}' is unavailable: {reason}")]
    VariantUnavailable { name: String, reason: String },

    /// Model evaluation failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// A data-integrity fault.
    #[error("data integrity fault: {0}")]
    Integrity(#[from] IntegrityError),
}

impl CodedError for PredictError {
    fn code(&self) -> &'static str {
        match self {
            PredictError::InvalidMotion(e) => e.code(),
            PredictError::UnknownVariant { .. } => "PREDICT_001",
            PredictError::VariantUnavailable { .. } => "PREDICT_002",
            PredictError::Inference(e) => e.code(),
            PredictError::Integrity(e) => e.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            PredictError::InvalidMotion(_) => "request",
            PredictError::UnknownVariant { .. } | PredictError::VariantUnavailable { .. } => {
                "variant"
            }
            PredictError::Inference(_) => "inference",
            PredictError::Integrity(_) => "integrity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_codes() {
        assert_eq!(InferenceError::InterpreterNotFound.code(), "INFER_001");
        assert_eq!(
            InferenceError::Timeout { timeout_secs: 5 }.to_string(),
            "Model runner timed out after 5 seconds"
        );
        assert_eq!(InferenceError::process_failed(2, "boom").code(), "INFER_006");
    }

    #[test]
    fn test_predict_error_forwards_codes() {
        let err = PredictError::from(MotionError::WrongArity(5));
        assert_eq!(err.code(), "MOTION_001");
        assert_eq!(err.category(), "request");

        let err = PredictError::from(IntegrityError::NoVertices);
        assert_eq!(err.code(), "INTEGRITY_002");
        assert!(err.to_string().starts_with("data integrity fault"));
    }

    #[test]
    fn test_variant_error_forwards_codes() {
        let err = VariantError::from(ConfigError::NoVariants);
        assert_eq!(err.code(), "CONFIG_007");
        assert_eq!(err.category(), "config");
    }
}
