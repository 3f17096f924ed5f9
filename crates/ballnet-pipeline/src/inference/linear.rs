//! Affine surrogate model.

use std::path::Path;

use ballnet_core::ModelInput;
use serde::{Deserialize, Serialize};

use super::{InferenceAdapter, InferenceOutput, RawOutput};
use crate::error::{InferenceError, InferenceResult};

/// Weights of an affine model `y = W x + b`.
///
/// ```json
/// {
///   "force_weights": [[...6 values...], ...6 rows...],
///   "force_bias": [...6 values...],
///   "node_weights": [[...6 values...], ...3 * N_def rows...],
///   "node_bias": [...3 * N_def values...]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearWeights {
    pub force_weights: Vec<[f32; 6]>,
    pub force_bias: Vec<f32>,
    pub node_weights: Vec<[f32; 6]>,
    pub node_bias: Vec<f32>,
}

impl LinearWeights {
    /// All-zero weights for `node_count` nodes.
    pub fn zeros(node_count: usize) -> Self {
        Self {
            force_weights: vec![[0.0; 6]; 6],
            force_bias: vec![0.0; 6],
            node_weights: vec![[0.0; 6]; node_count * 3],
            node_bias: vec![0.0; node_count * 3],
        }
    }

    fn validate(&self) -> InferenceResult<()> {
        if self.force_weights.len() != 6 {
            return Err(InferenceError::invalid_shape(
                "force_weights",
                "6 rows",
                self.force_weights.len(),
            ));
        }
        if self.force_bias.len() != 6 {
            return Err(InferenceError::invalid_shape(
                "force_bias",
                "6",
                self.force_bias.len(),
            ));
        }
        if self.node_weights.len() % 3 != 0 {
            return Err(InferenceError::invalid_shape(
                "node_weights",
                "a multiple of 3 rows",
                self.node_weights.len(),
            ));
        }
        if self.node_bias.len() != self.node_weights.len() {
            return Err(InferenceError::invalid_shape(
                "node_bias",
                self.node_weights.len().to_string(),
                self.node_bias.len(),
            ));
        }
        let finite = self
            .force_weights
            .iter()
            .chain(&self.node_weights)
            .flatten()
            .chain(&self.force_bias)
            .chain(&self.node_bias)
            .all(|v| v.is_finite());
        if !finite {
            return Err(InferenceError::NonFinite {
                what: "linear model weights",
            });
        }
        Ok(())
    }
}

fn affine(rows: &[[f32; 6]], bias: &[f32], x: &[f32; 6]) -> Vec<f32> {
    rows.iter()
        .zip(bias)
        .map(|(row, b)| row.iter().zip(x).map(|(w, v)| w * v).sum::<f32>() + b)
        .collect()
}

/// An affine surrogate evaluated in-process.
#[derive(Debug, Clone)]
pub struct LinearModel {
    name: String,
    weights: LinearWeights,
}

impl LinearModel {
    /// Creates a model after checking weight shapes.
    pub fn from_weights(name: impl Into<String>, weights: LinearWeights) -> InferenceResult<Self> {
        weights.validate()?;
        Ok(Self {
            name: name.into(),
            weights,
        })
    }

    /// Reads weights from a JSON file.
    pub fn from_path(path: &Path) -> InferenceResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| InferenceError::ReadModel {
            path: path.to_path_buf(),
            source,
        })?;
        let weights: LinearWeights =
            serde_json::from_str(&text).map_err(|source| InferenceError::ParseModel {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "linear".to_string());
        log::debug!("loaded linear model {} from {}", name, path.display());
        Self::from_weights(name, weights)
    }

    pub fn weights(&self) -> &LinearWeights {
        &self.weights
    }
}

impl InferenceAdapter for LinearModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn infer(&self, input: &ModelInput) -> InferenceResult<InferenceOutput> {
        let force = affine(&self.weights.force_weights, &self.weights.force_bias, &input.0);
        let nodes = affine(&self.weights.node_weights, &self.weights.node_bias, &input.0);
        RawOutput {
            force: force.into_iter().map(f64::from).collect(),
            nodes,
        }
        .into_output()
    }

    fn node_count(&self) -> Option<usize> {
        Some(self.weights.node_weights.len() / 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_model_outputs_zero() {
        let model = LinearModel::from_weights("zero", LinearWeights::zeros(4)).unwrap();
        let output = model.infer(&ModelInput([1.0; 6])).unwrap();
        assert_eq!(output.force.to_array(), [0.0; 6]);
        assert_eq!(output.displacements.len(), 4);
        assert_eq!(model.node_count(), Some(4));
    }

    #[test]
    fn test_affine_evaluation() {
        let mut weights = LinearWeights::zeros(1);
        weights.force_weights[0] = [1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        weights.force_bias[5] = 0.5;
        weights.node_weights[2] = [0.0, 0.0, 2.0, 0.0, 0.0, 0.0];
        weights.node_bias[0] = -1.0;
        let model = LinearModel::from_weights("affine", weights).unwrap();

        let output = model.infer(&ModelInput([3.0, 0.0, 1.5, 0.0, 0.0, 0.0])).unwrap();
        assert_eq!(output.force.fx, 3.0);
        assert_eq!(output.force.tz, 0.5);
        assert_eq!(output.displacements.as_slice(), &[[-1.0, 0.0, 3.0]]);
    }

    #[test]
    fn test_shape_validation() {
        let mut weights = LinearWeights::zeros(2);
        weights.node_bias.pop();
        assert!(matches!(
            LinearModel::from_weights("bad", weights),
            Err(InferenceError::InvalidShape { what: "node_bias", .. })
        ));

        let mut weights = LinearWeights::zeros(2);
        weights.force_bias.push(0.0);
        assert!(LinearModel::from_weights("bad", weights).is_err());
    }

    #[test]
    fn test_from_path() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("surrogate.json");
        std::fs::write(&path, serde_json::to_string(&LinearWeights::zeros(3)).unwrap()).unwrap();
        let model = LinearModel::from_path(&path).unwrap();
        assert_eq!(model.name(), "surrogate");
        assert_eq!(model.node_count(), Some(3));

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            LinearModel::from_path(&path),
            Err(InferenceError::ParseModel { .. })
        ));
    }
}
