//! Deformation reconstruction.
//!
//! A model predicts displacements only for the deformable nodes. The
//! reconstructor scatters them into a dense per-vertex field aligned with the
//! reference topology; every other vertex keeps a zero displacement.

use ballnet_core::geometry::add;
use ballnet_core::{
    DenseDisplacementField, IndexKind, IntegrityError, IntegrityResult, ReferenceTopology,
    SparseDisplacementField,
};

/// Scatters `sparse` into a zeroed field of `vertex_count` entries.
///
/// Entry `i` of `sparse` is added to `node_indices[i]`, so repeated indices
/// accumulate. An index outside `[0, vertex_count)` or a length mismatch
/// between `sparse` and `node_indices` is an integrity fault; nothing is
/// clamped or skipped.
pub fn scatter(
    sparse: &SparseDisplacementField,
    node_indices: &[u32],
    vertex_count: usize,
) -> IntegrityResult<DenseDisplacementField> {
    if sparse.len() != node_indices.len() {
        return Err(IntegrityError::LengthMismatch {
            what: "sparse displacement field",
            expected: node_indices.len(),
            found: sparse.len(),
        });
    }

    let mut dense = DenseDisplacementField::zeros(vertex_count);
    let slots = dense.as_mut_slice();
    for (position, (&index, &displacement)) in
        node_indices.iter().zip(sparse.as_slice()).enumerate()
    {
        let slot = slots
            .get_mut(index as usize)
            .ok_or(IntegrityError::IndexOutOfRange {
                kind: IndexKind::DeformNode,
                position,
                index: index as usize,
                vertex_count,
            })?;
        *slot = add(*slot, displacement);
    }
    Ok(dense)
}

/// Scatters `sparse` onto the deformable nodes of `topology`.
pub fn reconstruct(
    topology: &ReferenceTopology,
    sparse: &SparseDisplacementField,
) -> IntegrityResult<DenseDisplacementField> {
    scatter(sparse, topology.deform_nodes(), topology.vertex_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unit_vectors() -> SparseDisplacementField {
        SparseDisplacementField::new(vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    #[test]
    fn test_scatter_places_vectors_at_indices() {
        let dense = scatter(&unit_vectors(), &[0, 2, 4], 5).unwrap();
        assert_eq!(
            dense.as_slice(),
            &[
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
            ]
        );
    }

    #[test]
    fn test_scatter_index_out_of_range() {
        let err = scatter(&unit_vectors(), &[0, 2, 5], 5).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::IndexOutOfRange {
                kind: IndexKind::DeformNode,
                position: 2,
                index: 5,
                vertex_count: 5,
            }
        );
    }

    #[test]
    fn test_scatter_accumulates_duplicates() {
        let dense = scatter(&unit_vectors(), &[1, 1, 1], 3).unwrap();
        assert_eq!(dense.as_slice()[1], [1.0, 1.0, 1.0]);
        assert_eq!(dense.as_slice()[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scatter_length_mismatch() {
        let err = scatter(&unit_vectors(), &[0, 1], 5).unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::LengthMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_dense_length_equals_vertex_count() {
        let dense = scatter(&SparseDisplacementField::default(), &[], 7).unwrap();
        assert_eq!(dense.len(), 7);
        assert_eq!(dense.max_magnitude(), 0.0);
    }
}
