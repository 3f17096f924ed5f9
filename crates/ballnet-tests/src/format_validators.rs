//! GLB validators for test infrastructure.
//!
//! `validate_glb` checks the container layout byte by byte;
//! `read_glb_mesh` loads the file with the `gltf` crate and pulls the mesh
//! attributes back out, so exported files are checked by an independent
//! reader.

use std::fmt;

use ballnet_core::{Face, Rgba, Vec3};

/// Error type for format validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    /// The format being validated.
    pub format: &'static str,
    /// Description of what went wrong.
    pub message: String,
    /// Byte offset where the error occurred, if applicable.
    pub offset: Option<usize>,
}

impl FormatError {
    /// Create a new format error.
    pub fn new(format: &'static str, message: impl Into<String>) -> Self {
        Self {
            format,
            message: message.into(),
            offset: None,
        }
    }

    /// Create a format error with a byte offset.
    pub fn at_offset(format: &'static str, message: impl Into<String>, offset: usize) -> Self {
        Self {
            format,
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at byte {}: {}", self.format, offset, self.message),
            None => write!(f, "{}: {}", self.format, self.message),
        }
    }
}

impl std::error::Error for FormatError {}

/// Information extracted from a GLB header and chunk table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlbInfo {
    /// glTF version (should be 2).
    pub version: u32,
    /// Total file length in bytes.
    pub length: u32,
    /// Length of the JSON chunk.
    pub json_chunk_length: u32,
    /// Length of the binary chunk (if present).
    pub bin_chunk_length: Option<u32>,
    /// Number of chunks in the file.
    pub num_chunks: u32,
}

/// Validate the GLB container layout.
///
/// Checks the magic, version 2, a declared length equal to the file size,
/// a JSON first chunk and 4-byte aligned chunk lengths.
pub fn validate_glb(data: &[u8]) -> Result<GlbInfo, FormatError> {
    const GLB_MAGIC: &[u8; 4] = b"glTF";
    const HEADER_SIZE: usize = 12;
    const CHUNK_HEADER_SIZE: usize = 8;
    const JSON_CHUNK_TYPE: u32 = 0x4E4F534A; // "JSON" in little-endian
    const BIN_CHUNK_TYPE: u32 = 0x004E4942; // "BIN\0" in little-endian

    if data.len() < HEADER_SIZE {
        return Err(FormatError::new(
            "GLB",
            format!(
                "File too short: {} bytes (minimum {} required)",
                data.len(),
                HEADER_SIZE
            ),
        ));
    }

    if &data[0..4] != GLB_MAGIC {
        return Err(FormatError::at_offset(
            "GLB",
            format!("Invalid GLB magic: expected 'glTF', got {:?}", &data[0..4]),
            0,
        ));
    }

    let read_u32 = |at: usize| u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]);

    let version = read_u32(4);
    if version != 2 {
        return Err(FormatError::at_offset(
            "GLB",
            format!("Unsupported GLB version: {} (expected 2)", version),
            4,
        ));
    }

    let length = read_u32(8);
    if length as usize != data.len() {
        return Err(FormatError::at_offset(
            "GLB",
            format!(
                "Declared length {} does not match file size {}",
                length,
                data.len()
            ),
            8,
        ));
    }

    let mut offset = HEADER_SIZE;
    let mut num_chunks = 0u32;
    let mut json_chunk_length = 0u32;
    let mut bin_chunk_length: Option<u32> = None;

    while offset + CHUNK_HEADER_SIZE <= data.len() {
        let chunk_length = read_u32(offset);
        let chunk_type = read_u32(offset + 4);

        if chunk_length % 4 != 0 {
            return Err(FormatError::at_offset(
                "GLB",
                format!("Chunk length {} is not 4-byte aligned", chunk_length),
                offset,
            ));
        }

        if num_chunks == 0 {
            if chunk_type != JSON_CHUNK_TYPE {
                return Err(FormatError::at_offset(
                    "GLB",
                    format!("First chunk must be JSON, got type 0x{:08X}", chunk_type),
                    offset,
                ));
            }
            json_chunk_length = chunk_length;
        } else if chunk_type == BIN_CHUNK_TYPE {
            bin_chunk_length = Some(chunk_length);
        }

        num_chunks += 1;
        offset += CHUNK_HEADER_SIZE + chunk_length as usize;
    }

    if offset != data.len() {
        return Err(FormatError::at_offset("GLB", "Trailing bytes after last chunk", offset));
    }
    if num_chunks == 0 {
        return Err(FormatError::new("GLB", "No chunks found"));
    }

    Ok(GlbInfo {
        version,
        length,
        json_chunk_length,
        bin_chunk_length,
        num_chunks,
    })
}

/// Mesh attributes read back from a GLB file.
#[derive(Debug, Clone, PartialEq)]
pub struct GlbMesh {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Rgba>,
    pub faces: Vec<Face>,
    pub normals: Option<Vec<Vec3>>,
    pub generator: Option<String>,
    pub material_count: usize,
}

/// Loads a GLB with the `gltf` crate and reads the first primitive.
pub fn read_glb_mesh(data: &[u8]) -> Result<GlbMesh, FormatError> {
    let (document, buffers, _) =
        gltf::import_slice(data).map_err(|e| FormatError::new("glTF", e.to_string()))?;

    let mesh = document
        .meshes()
        .next()
        .ok_or_else(|| FormatError::new("glTF", "No mesh"))?;
    let primitive = mesh
        .primitives()
        .next()
        .ok_or_else(|| FormatError::new("glTF", "Mesh has no primitive"))?;
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        return Err(FormatError::new("glTF", "Primitive is not a triangle list"));
    }

    let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| FormatError::new("glTF", "Missing POSITION"))?
        .collect();
    let colors: Vec<Rgba> = reader
        .read_colors(0)
        .ok_or_else(|| FormatError::new("glTF", "Missing COLOR_0"))?
        .into_rgba_u8()
        .collect();
    let indices: Vec<u32> = reader
        .read_indices()
        .ok_or_else(|| FormatError::new("glTF", "Missing indices"))?
        .into_u32()
        .collect();
    if indices.len() % 3 != 0 {
        return Err(FormatError::new(
            "glTF",
            format!("Index count {} is not a multiple of 3", indices.len()),
        ));
    }
    let faces = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    let normals = reader.read_normals().map(|n| n.collect());

    Ok(GlbMesh {
        positions,
        colors,
        faces,
        normals,
        generator: document.as_json().asset.generator.clone(),
        material_count: document.materials().count(),
    })
}
