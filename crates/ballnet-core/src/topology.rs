//! Reference geometry of a deformable body variant.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::{IndexKind, IntegrityError, IntegrityResult};
use crate::geometry::{BoundingBox, Vec3};

/// Triangle as three 0-based vertex indices.
pub type Face = [u32; 3];

/// Immutable reference mesh plus the deformable-node index map.
///
/// Construction validates that every face index and every deformable-node
/// index lies in `[0, vertex_count)`. Once built, a topology is shared
/// read-only by every prediction for its variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTopology {
    vertices: Vec<Vec3>,
    faces: Vec<Face>,
    deform_nodes: Vec<u32>,
}

impl ReferenceTopology {
    /// Creates a topology after validating all indices.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<Face>, deform_nodes: Vec<u32>) -> IntegrityResult<Self> {
        if vertices.is_empty() {
            return Err(IntegrityError::NoVertices);
        }
        let vertex_count = vertices.len();

        for (position, face) in faces.iter().enumerate() {
            for &index in face {
                check_index(IndexKind::Face, position, index, vertex_count)?;
            }
        }
        for (position, &index) in deform_nodes.iter().enumerate() {
            check_index(IndexKind::DeformNode, position, index, vertex_count)?;
        }

        Ok(Self {
            vertices,
            faces,
            deform_nodes,
        })
    }

    /// Number of reference vertices (`N_ref`).
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of deformable nodes (`N_def`).
    pub fn deform_node_count(&self) -> usize {
        self.deform_nodes.len()
    }

    /// Reference vertex positions, in the model frame.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Triangles, 0-based.
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Vertex index of each deformable node.
    pub fn deform_nodes(&self) -> &[u32] {
        &self.deform_nodes
    }

    /// Summary statistics.
    pub fn stats(&self) -> TopologyStats {
        let mut seen = HashSet::with_capacity(self.deform_nodes.len());
        let duplicate_deform_nodes = self
            .deform_nodes
            .iter()
            .filter(|&&index| !seen.insert(index))
            .count();

        TopologyStats {
            vertex_count: self.vertex_count(),
            face_count: self.face_count(),
            deform_node_count: self.deform_node_count(),
            duplicate_deform_nodes,
            bounds: BoundingBox::from_points(&self.vertices),
        }
    }
}

fn check_index(kind: IndexKind, position: usize, index: u32, vertex_count: usize) -> IntegrityResult<()> {
    if (index as usize) < vertex_count {
        Ok(())
    } else {
        Err(IntegrityError::IndexOutOfRange {
            kind,
            position,
            index: index as usize,
            vertex_count,
        })
    }
}

/// Counts and bounds describing a reference topology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyStats {
    pub vertex_count: usize,
    pub face_count: usize,
    pub deform_node_count: usize,
    /// Deformable-node entries that repeat an earlier vertex index. Their
    /// displacements accumulate.
    pub duplicate_deform_nodes: usize,
    pub bounds: Option<BoundingBox>,
}
