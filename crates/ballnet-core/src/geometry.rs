//! Small vector helpers over `[f32; 3]`.
//!
//! Positions and displacements are stored as plain arrays so they can be
//! handed to GPU and file buffers without conversion.

use serde::{Deserialize, Serialize};

/// A 3D vector or point.
pub type Vec3 = [f32; 3];

/// The zero vector.
pub const ZERO: Vec3 = [0.0; 3];

/// Component-wise sum.
#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Component-wise difference.
#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Cross product.
#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Euclidean length.
#[inline]
pub fn norm(v: Vec3) -> f32 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Unit vector in the direction of `v`, or zero for a zero vector.
#[inline]
pub fn normalize(v: Vec3) -> Vec3 {
    let len = norm(v);
    if len > f32::EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        ZERO
    }
}

/// Returns true if every component is finite.
#[inline]
pub fn is_finite(v: Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from explicit corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Computes the bounds of a point set. Returns `None` when empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let mut bounds = Self::new(first, first);
        for p in &points[1..] {
            for axis in 0..3 {
                bounds.min[axis] = bounds.min[axis].min(p[axis]);
                bounds.max[axis] = bounds.max[axis].max(p[axis]);
            }
        }
        Some(bounds)
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        sub(self.max, self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_norm_and_normalize() {
        assert!((norm([3.0, 4.0, 0.0]) - 5.0).abs() < 1e-6);
        assert_eq!(normalize(ZERO), ZERO);
        let n = normalize([0.0, 0.0, 2.0]);
        assert!((n[2] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cross_right_handed() {
        assert_eq!(cross([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_bounding_box() {
        assert!(BoundingBox::from_points(&[]).is_none());
        let bounds =
            BoundingBox::from_points(&[[1.0, -2.0, 0.5], [-1.0, 3.0, 0.0], [0.0, 0.0, 2.0]])
                .unwrap();
        assert_eq!(bounds.min, [-1.0, -2.0, 0.0]);
        assert_eq!(bounds.max, [1.0, 3.0, 2.0]);
        assert_eq!(bounds.size(), [2.0, 5.0, 2.0]);
    }
}
