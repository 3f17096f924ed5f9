//! Coordinate-frame correction of deformed positions.

use ballnet_core::geometry::add;
use ballnet_core::{DenseDisplacementField, FrameCorrection, IntegrityError, IntegrityResult, Vec3};

/// Adds `dense` to `reference` in the model frame, then applies `frame`
/// exactly once to each sum.
pub fn deform_positions(
    reference: &[Vec3],
    dense: &DenseDisplacementField,
    frame: &FrameCorrection,
) -> IntegrityResult<Vec<Vec3>> {
    if dense.len() != reference.len() {
        return Err(IntegrityError::LengthMismatch {
            what: "dense displacement field",
            expected: reference.len(),
            found: dense.len(),
        });
    }
    Ok(reference
        .iter()
        .zip(dense.as_slice())
        .map(|(&p, &d)| frame.apply(add(p, d)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displacement_added_before_rotation() {
        let reference = [[1.0, 2.0, 3.0]];
        let dense = DenseDisplacementField::from_vec(vec![[0.0, 1.0, 0.0]]);
        let out = deform_positions(&reference, &dense, &FrameCorrection::RotateXNeg90).unwrap();
        // (1, 3, 3) -> (1, 3, -3)
        assert_eq!(out, vec![[1.0, 3.0, -3.0]]);
    }

    #[test]
    fn test_identity_frame() {
        let reference = [[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]];
        let dense = DenseDisplacementField::zeros(2);
        let out = deform_positions(&reference, &dense, &FrameCorrection::Identity).unwrap();
        assert_eq!(out, reference.to_vec());
    }

    #[test]
    fn test_length_mismatch() {
        let err = deform_positions(&[[0.0; 3]], &DenseDisplacementField::zeros(2), &FrameCorrection::Identity)
            .unwrap_err();
        assert!(matches!(err, IntegrityError::LengthMismatch { expected: 1, found: 2, .. }));
    }
}
