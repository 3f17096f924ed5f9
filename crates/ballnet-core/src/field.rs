//! Displacement fields.

use crate::error::{IntegrityError, IntegrityResult};
use crate::geometry::{norm, Vec3};

/// One displacement vector per deformable node, as produced by a model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseDisplacementField(Vec<Vec3>);

impl SparseDisplacementField {
    /// Wraps a list of per-node displacements.
    pub fn new(displacements: Vec<Vec3>) -> Self {
        Self(displacements)
    }

    /// Reshapes a flat `[x0, y0, z0, x1, ...]` buffer into vectors.
    pub fn from_flat(values: &[f32]) -> IntegrityResult<Self> {
        if values.len() % 3 != 0 {
            return Err(IntegrityError::LengthMismatch {
                what: "flat displacement buffer (multiple of 3)",
                expected: values.len() - values.len() % 3,
                found: values.len(),
            });
        }
        Ok(Self(
            values
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
        ))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-node displacements.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.0
    }
}

/// One displacement vector per reference vertex.
///
/// Always exactly as long as the reference vertex array; vertices that are not
/// deformable nodes hold the zero vector.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseDisplacementField(Vec<Vec3>);

impl DenseDisplacementField {
    /// A zero field over `vertex_count` vertices.
    pub fn zeros(vertex_count: usize) -> Self {
        Self(vec![[0.0; 3]; vertex_count])
    }

    /// Wraps per-vertex displacements.
    pub fn from_vec(displacements: Vec<Vec3>) -> Self {
        Self(displacements)
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Per-vertex displacements.
    pub fn as_slice(&self) -> &[Vec3] {
        &self.0
    }

    /// Mutable access for accumulation.
    pub fn as_mut_slice(&mut self) -> &mut [Vec3] {
        &mut self.0
    }

    /// Euclidean magnitude of every displacement.
    pub fn magnitudes(&self) -> Vec<f32> {
        self.0.iter().map(|&d| norm(d)).collect()
    }

    /// Largest displacement magnitude, or 0 for an empty field.
    pub fn max_magnitude(&self) -> f32 {
        self.0.iter().map(|&d| norm(d)).fold(0.0, f32::max)
    }

    /// Consumes the field.
    pub fn into_vec(self) -> Vec<Vec3> {
        self.0
    }
}
