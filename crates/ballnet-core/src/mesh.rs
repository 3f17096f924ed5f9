//! Renderable mesh types.

use crate::error::{IndexKind, IntegrityError, IntegrityResult};
use crate::geometry::{BoundingBox, Vec3};
use crate::topology::Face;

/// 8-bit RGBA color.
pub type Rgba = [u8; 4];

/// Deformed, frame-corrected mesh with one color per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct DeformedMesh {
    positions: Vec<Vec3>,
    faces: Vec<Face>,
    colors: Vec<Rgba>,
}

impl DeformedMesh {
    /// Creates a mesh, checking that colors match vertices and every face
    /// index is in range.
    pub fn new(positions: Vec<Vec3>, faces: Vec<Face>, colors: Vec<Rgba>) -> IntegrityResult<Self> {
        validate_parts(&positions, &faces, &colors)?;
        Ok(Self {
            positions,
            faces,
            colors,
        })
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// A mesh duplicated back-to-back so a backface-culling renderer shows both
/// sides.
///
/// The first `front_vertex_count` vertices and the first half of the faces
/// form the front block; the rest is the back block, with identical positions
/// and colors and reversed winding. The two blocks share no vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleSidedMesh {
    positions: Vec<Vec3>,
    faces: Vec<Face>,
    colors: Vec<Rgba>,
    front_vertex_count: usize,
}

impl DoubleSidedMesh {
    /// Assembles a double-sided mesh from already stacked arrays.
    pub fn from_parts(
        positions: Vec<Vec3>,
        faces: Vec<Face>,
        colors: Vec<Rgba>,
        front_vertex_count: usize,
    ) -> IntegrityResult<Self> {
        validate_parts(&positions, &faces, &colors)?;
        if positions.len() != front_vertex_count * 2 {
            return Err(IntegrityError::LengthMismatch {
                what: "double-sided vertices",
                expected: front_vertex_count * 2,
                found: positions.len(),
            });
        }
        if faces.len() % 2 != 0 {
            return Err(IntegrityError::LengthMismatch {
                what: "double-sided faces (even count)",
                expected: faces.len() + 1,
                found: faces.len(),
            });
        }
        Ok(Self {
            positions,
            faces,
            colors,
            front_vertex_count,
        })
    }

    /// All `2 x N_ref` vertex positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// All `2 x N_faces` faces, front block first.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// All `2 x N_ref` colors.
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Vertex count of one side (`N_ref`).
    pub fn front_vertex_count(&self) -> usize {
        self.front_vertex_count
    }

    /// Face count of one side (`N_faces`).
    pub fn front_face_count(&self) -> usize {
        self.faces.len() / 2
    }

    /// Front-block faces.
    pub fn front_faces(&self) -> &[Face] {
        &self.faces[..self.front_face_count()]
    }

    /// Back-block faces.
    pub fn back_faces(&self) -> &[Face] {
        &self.faces[self.front_face_count()..]
    }

    /// Bounds of the vertex positions.
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.positions)
    }
}

fn validate_parts(positions: &[Vec3], faces: &[Face], colors: &[Rgba]) -> IntegrityResult<()> {
    if colors.len() != positions.len() {
        return Err(IntegrityError::LengthMismatch {
            what: "vertex colors",
            expected: positions.len(),
            found: colors.len(),
        });
    }
    for (position, face) in faces.iter().enumerate() {
        if let Some(&index) = face.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(IntegrityError::IndexOutOfRange {
                kind: IndexKind::Face,
                position,
                index: index as usize,
                vertex_count: positions.len(),
            });
        }
    }
    Ok(())
}
