//! Mesh synthesis.

use ballnet_core::{
    DeformedMesh, DenseDisplacementField, DoubleSidedMesh, FrameCorrection, IntegrityError,
    IntegrityResult, ReferenceTopology,
};

use crate::colormap::ColorMapper;
use crate::frame::deform_positions;

/// Builds the deformed, colored mesh for one dense displacement field.
///
/// Colors are computed from the displacement magnitudes, which are invariant
/// under the frame correction.
pub fn build_deformed_mesh(
    topology: &ReferenceTopology,
    dense: &DenseDisplacementField,
    mapper: &ColorMapper,
    frame: &FrameCorrection,
) -> IntegrityResult<DeformedMesh> {
    let positions = deform_positions(topology.vertices(), dense, frame)?;
    let colors = mapper.map(dense);
    DeformedMesh::new(positions, topology.faces().to_vec(), colors)
}

/// Duplicates `mesh` back-to-back.
///
/// Vertices and colors are stacked verbatim. Front faces are kept; back face
/// `i + N_faces` is front face `(a, b, c)` reversed and offset to
/// `(c + N_ref, b + N_ref, a + N_ref)`. Duplicated vertices are never welded.
pub fn make_double_sided(mesh: &DeformedMesh) -> IntegrityResult<DoubleSidedMesh> {
    let n = mesh.vertex_count();
    let offset = n
        .checked_mul(2)
        .and_then(|total| u32::try_from(total).ok())
        .map(|_| n as u32)
        .ok_or(IntegrityError::TooManyVertices {
            count: n.saturating_mul(2),
        })?;

    let mut positions = Vec::with_capacity(n * 2);
    positions.extend_from_slice(mesh.positions());
    positions.extend_from_slice(mesh.positions());

    let mut colors = Vec::with_capacity(n * 2);
    colors.extend_from_slice(mesh.colors());
    colors.extend_from_slice(mesh.colors());

    let mut faces = Vec::with_capacity(mesh.face_count() * 2);
    faces.extend_from_slice(mesh.faces());
    faces.extend(
        mesh.faces()
            .iter()
            .map(|&[a, b, c]| [c + offset, b + offset, a + offset]),
    );

    DoubleSidedMesh::from_parts(positions, faces, colors, n)
}
