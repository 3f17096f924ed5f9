//! Binary glTF (GLB) export of double-sided meshes.
//!
//! The container holds one mesh with one triangle primitive:
//!
//! | Attribute | Accessor type | Component |
//! |-----------|---------------|-----------|
//! | `POSITION` | `VEC3` with min/max | `FLOAT` |
//! | `COLOR_0` | `VEC4`, normalized | `UNSIGNED_BYTE` |
//! | `NORMAL` (optional) | `VEC3` | `FLOAT` |
//! | indices | `SCALAR` | `UNSIGNED_SHORT` when every index fits, else `UNSIGNED_INT` |
//!
//! Exported files are transient artifacts; nothing here reads them back.

use std::io::Write;
use std::path::{Path, PathBuf};

use ballnet_core::geometry::{add, cross, normalize, sub, ZERO};
use ballnet_core::{DoubleSidedMesh, Vec3};

use crate::error::{ExportError, ExportResult};

const COMPONENT_UNSIGNED_BYTE: u32 = 5121;
const COMPONENT_UNSIGNED_SHORT: u32 = 5123;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const COMPONENT_FLOAT: u32 = 5126;
const TARGET_ARRAY_BUFFER: u32 = 34962;
const TARGET_ELEMENT_ARRAY_BUFFER: u32 = 34963;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const CHUNK_JSON: u32 = 0x4E4F534A;
const CHUNK_BIN: u32 = 0x004E4942;

/// Options for GLB export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Emit per-vertex normals.
    pub include_normals: bool,
    /// Value of `asset.generator`.
    pub generator: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_normals: false,
            generator: concat!("ballnet-pipeline ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ExportOptions {
    /// Sets whether normals are emitted.
    pub fn with_normals(mut self, include: bool) -> Self {
        self.include_normals = include;
        self
    }

    /// Sets the generator string.
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }
}

/// Area-weighted vertex normals.
///
/// Each face contributes its unnormalized cross product to its own three
/// vertices. Front and back blocks share no vertex, so the back block gets
/// the opposite normals of the front block.
pub fn compute_vertex_normals(mesh: &DoubleSidedMesh) -> Vec<Vec3> {
    let positions = mesh.positions();
    let mut normals = vec![ZERO; positions.len()];
    for &[a, b, c] in mesh.faces() {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let n = cross(sub(positions[b], positions[a]), sub(positions[c], positions[a]));
        normals[a] = add(normals[a], n);
        normals[b] = add(normals[b], n);
        normals[c] = add(normals[c], n);
    }
    normals.into_iter().map(normalize).collect()
}

/// Serializes `mesh` into GLB bytes.
pub fn build_glb(mesh: &DoubleSidedMesh, options: &ExportOptions) -> ExportResult<Vec<u8>> {
    if mesh.face_count() == 0 {
        return Err(ExportError::EmptyMesh);
    }
    let vertex_count = mesh.vertex_count();

    let mut binary: Vec<u8> = Vec::new();
    let mut views: Vec<serde_json::Value> = Vec::new();

    let mut push_view = |binary: &mut Vec<u8>, bytes: &[u8], target: u32| -> usize {
        let offset = binary.len();
        binary.extend_from_slice(bytes);
        while binary.len() % 4 != 0 {
            binary.push(0);
        }
        views.push(serde_json::json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target
        }));
        views.len() - 1
    };

    let positions_view = push_view(
        &mut binary,
        bytemuck::cast_slice(mesh.positions()),
        TARGET_ARRAY_BUFFER,
    );
    let colors_view = push_view(
        &mut binary,
        bytemuck::cast_slice(mesh.colors()),
        TARGET_ARRAY_BUFFER,
    );
    let normals_view = if options.include_normals {
        let normals = compute_vertex_normals(mesh);
        Some(push_view(
            &mut binary,
            bytemuck::cast_slice(&normals),
            TARGET_ARRAY_BUFFER,
        ))
    } else {
        None
    };

    let indices: &[u32] = bytemuck::cast_slice(mesh.faces());
    let max_index = indices.iter().copied().max().unwrap_or(0);
    let (index_bytes, index_component_type): (Vec<u8>, u32) = if max_index <= u16::MAX as u32 {
        let short: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
        (bytemuck::cast_slice(&short).to_vec(), COMPONENT_UNSIGNED_SHORT)
    } else {
        (bytemuck::cast_slice(indices).to_vec(), COMPONENT_UNSIGNED_INT)
    };
    let indices_view = push_view(&mut binary, &index_bytes, TARGET_ELEMENT_ARRAY_BUFFER);

    // Every mesh has at least one triangle here, so bounds exist.
    let bounds = mesh.bounds().unwrap_or_else(|| ballnet_core::BoundingBox::new(ZERO, ZERO));

    let mut accessors = vec![
        serde_json::json!({
            "bufferView": positions_view,
            "componentType": COMPONENT_FLOAT,
            "count": vertex_count,
            "type": "VEC3",
            "min": bounds.min,
            "max": bounds.max
        }),
        serde_json::json!({
            "bufferView": colors_view,
            "componentType": COMPONENT_UNSIGNED_BYTE,
            "normalized": true,
            "count": vertex_count,
            "type": "VEC4"
        }),
        serde_json::json!({
            "bufferView": indices_view,
            "componentType": index_component_type,
            "count": indices.len(),
            "type": "SCALAR"
        }),
    ];
    let mut attributes = serde_json::json!({
        "POSITION": 0,
        "COLOR_0": 1
    });
    if let Some(view) = normals_view {
        accessors.push(serde_json::json!({
            "bufferView": view,
            "componentType": COMPONENT_FLOAT,
            "count": vertex_count,
            "type": "VEC3"
        }));
        attributes["NORMAL"] = serde_json::json!(accessors.len() - 1);
    }

    let json = serde_json::json!({
        "asset": {
            "version": "2.0",
            "generator": options.generator
        },
        "buffers": [{
            "byteLength": binary.len()
        }],
        "bufferViews": views,
        "accessors": accessors,
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 1.0, 1.0, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0
            }
        }],
        "meshes": [{
            "primitives": [{
                "attributes": attributes,
                "indices": 2,
                "material": 0,
                "mode": 4
            }]
        }],
        "nodes": [{
            "mesh": 0
        }],
        "scenes": [{
            "nodes": [0]
        }],
        "scene": 0
    });

    let mut json_padded = serde_json::to_vec(&json).map_err(ExportError::Serialize)?;
    while json_padded.len() % 4 != 0 {
        json_padded.push(0x20);
    }

    let total_length = 12 + 8 + json_padded.len() + 8 + binary.len();
    let total_u32 =
        u32::try_from(total_length).map_err(|_| ExportError::TooLarge { bytes: total_length })?;

    let mut glb: Vec<u8> = Vec::with_capacity(total_length);
    glb.extend_from_slice(GLB_MAGIC);
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&total_u32.to_le_bytes());

    glb.extend_from_slice(&(json_padded.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(&json_padded);

    glb.extend_from_slice(&(binary.len() as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(&binary);

    log::debug!(
        "built GLB: {} vertices, {} faces, {} bytes",
        vertex_count,
        mesh.face_count(),
        glb.len()
    );
    Ok(glb)
}

/// Writes the GLB for `mesh` to `path`.
///
/// The file is written to a sibling temp file and renamed into place, so a
/// reader never sees a partial file.
pub fn export_glb_to_path(
    mesh: &DoubleSidedMesh,
    path: &Path,
    options: &ExportOptions,
) -> ExportResult<()> {
    let glb = build_glb(mesh, options)?;
    write_atomic(path, &glb)
}

/// Writes the GLB for `mesh` to the system temp directory as
/// `ballnet_<hash>.glb` and returns its path.
///
/// The name is derived from the content hash, so identical meshes share one
/// file. The file is left on disk for the caller to hand to a viewer.
pub fn export_glb_to_temp(mesh: &DoubleSidedMesh, options: &ExportOptions) -> ExportResult<PathBuf> {
    let glb = build_glb(mesh, options)?;
    let hash = blake3::hash(&glb).to_hex();
    let path = std::env::temp_dir().join(format!("ballnet_{}.glb", &hash[..16]));
    write_atomic(&path, &glb)?;
    Ok(path)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> ExportResult<()> {
    let write_err = |source: std::io::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = tempfile::Builder::new()
        .prefix(".ballnet_")
        .suffix(".glb.tmp")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    file.write_all(bytes).map_err(write_err)?;
    file.flush().map_err(write_err)?;
    file.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
