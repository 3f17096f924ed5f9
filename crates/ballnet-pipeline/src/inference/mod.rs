//! Inference adapters.
//!
//! An adapter wraps an opaque predictive model: it receives the six-value
//! [`ModelInput`] and returns the force vector together with one displacement
//! per deformable node, both from a single model evaluation.
//!
//! Two adapters are provided:
//!
//! - [`LinearModel`]: an affine surrogate stored as JSON weights, evaluated
//!   in-process
//! - [`SubprocessModel`]: an external runner process (by default a bundled
//!   Python script driving onnxruntime) exchanging JSON files

mod linear;
mod subprocess;

pub use linear::{LinearModel, LinearWeights};
pub use subprocess::{
    find_interpreter, SubprocessConfig, SubprocessModel, DEFAULT_TIMEOUT_SECS, PYTHON_ENV_VAR,
};

use ballnet_core::{ForceResult, ModelDescriptor, ModelInput, SparseDisplacementField};
use serde::{Deserialize, Serialize};

use crate::error::{InferenceError, InferenceResult};

/// A predictive model.
///
/// Implementations are read-only after construction and may be called from
/// several threads at once.
pub trait InferenceAdapter: Send + Sync {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Evaluates the model once.
    fn infer(&self, input: &ModelInput) -> InferenceResult<InferenceOutput>;

    /// Number of node displacements the model produces, if known before
    /// evaluation.
    fn node_count(&self) -> Option<usize> {
        None
    }
}

/// Force and node displacements from one model evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceOutput {
    pub force: ForceResult,
    pub displacements: SparseDisplacementField,
}

/// Untyped model output, as produced by a runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOutput {
    pub force: Vec<f64>,
    /// Flat `[x0, y0, z0, x1, ...]` node displacements.
    pub nodes: Vec<f32>,
}

impl RawOutput {
    /// Checks shapes and values and converts into a typed output.
    pub fn into_output(self) -> InferenceResult<InferenceOutput> {
        let force: [f64; 6] = self
            .force
            .as_slice()
            .try_into()
            .map_err(|_| InferenceError::invalid_shape("force output", "6", self.force.len()))?;
        if force.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite {
                what: "force output",
            });
        }
        if self.nodes.iter().any(|v| !v.is_finite()) {
            return Err(InferenceError::NonFinite {
                what: "node output",
            });
        }
        let displacements = SparseDisplacementField::from_flat(&self.nodes).map_err(|_| {
            InferenceError::invalid_shape("node output", "a multiple of 3", self.nodes.len())
        })?;
        Ok(InferenceOutput {
            force: ForceResult::from_array(force),
            displacements,
        })
    }
}

/// Builds the adapter described by `descriptor`. Paths must already be
/// resolved.
pub fn load_adapter(descriptor: &ModelDescriptor) -> InferenceResult<Box<dyn InferenceAdapter>> {
    match descriptor {
        ModelDescriptor::Linear { path } => Ok(Box::new(LinearModel::from_path(path)?)),
        ModelDescriptor::Subprocess {
            model,
            interpreter,
            runner,
            input_name,
            timeout_secs,
        } => {
            let mut config = SubprocessConfig::new(model)
                .input_name(input_name.clone())
                .timeout_secs(*timeout_secs);
            if let Some(interpreter) = interpreter {
                config = config.interpreter(interpreter);
            }
            if let Some(runner) = runner {
                config = config.runner(runner);
            }
            Ok(Box::new(SubprocessModel::new(config)?))
        }
    }
}
