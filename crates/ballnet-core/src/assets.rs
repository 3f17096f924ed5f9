//! Reference asset loading.
//!
//! Each body variant ships three comma-separated text files:
//!
//! | File | Columns | Contents |
//! |------|---------|----------|
//! | `surface_coordinate.txt` | 3 | vertex positions `x,y,z` |
//! | `surface_triangle.txt` | 3 | triangle vertex indices, 1-based |
//! | `deform_node.txt` | 1 | vertex index of each deformable node, 1-based |
//!
//! Indices are converted to 0-based on load and validated against the vertex
//! count, so a mismatched file set fails here rather than during prediction.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AssetError, AssetResult};
use crate::geometry::{is_finite, Vec3};
use crate::topology::{Face, ReferenceTopology};

/// Default vertex file name.
pub const DEFAULT_VERTICES_FILE: &str = "surface_coordinate.txt";
/// Default triangle file name.
pub const DEFAULT_FACES_FILE: &str = "surface_triangle.txt";
/// Default deformable-node file name.
pub const DEFAULT_DEFORM_NODES_FILE: &str = "deform_node.txt";

/// Location and conventions of a variant's asset files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFiles {
    /// Directory holding the files.
    pub dir: PathBuf,
    #[serde(default = "default_vertices")]
    pub vertices: String,
    #[serde(default = "default_faces")]
    pub faces: String,
    #[serde(default = "default_deform_nodes")]
    pub deform_nodes: String,
    /// Index of the first vertex in the triangle file.
    #[serde(default = "default_index_base")]
    pub face_index_base: u32,
    /// Index of the first vertex in the deformable-node file.
    #[serde(default = "default_index_base")]
    pub node_index_base: u32,
}

fn default_vertices() -> String {
    DEFAULT_VERTICES_FILE.to_string()
}

fn default_faces() -> String {
    DEFAULT_FACES_FILE.to_string()
}

fn default_deform_nodes() -> String {
    DEFAULT_DEFORM_NODES_FILE.to_string()
}

fn default_index_base() -> u32 {
    1
}

impl AssetFiles {
    /// Default file names and 1-based indices inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            vertices: default_vertices(),
            faces: default_faces(),
            deform_nodes: default_deform_nodes(),
            face_index_base: default_index_base(),
            node_index_base: default_index_base(),
        }
    }

    /// Resolves a relative `dir` against `base`.
    pub fn resolved(&self, base: &Path) -> Self {
        let mut files = self.clone();
        if files.dir.is_relative() {
            files.dir = base.join(&files.dir);
        }
        files
    }

    pub fn vertices_path(&self) -> PathBuf {
        self.dir.join(&self.vertices)
    }

    pub fn faces_path(&self) -> PathBuf {
        self.dir.join(&self.faces)
    }

    pub fn deform_nodes_path(&self) -> PathBuf {
        self.dir.join(&self.deform_nodes)
    }

    /// Loads and validates the reference topology.
    pub fn load(&self) -> AssetResult<ReferenceTopology> {
        load_topology(self)
    }
}

/// Loads the three asset files and builds a validated topology.
pub fn load_topology(files: &AssetFiles) -> AssetResult<ReferenceTopology> {
    let vertices = read_vertices(&files.vertices_path())?;
    let faces = read_faces(&files.faces_path(), files.face_index_base)?;
    let deform_nodes = read_indices(&files.deform_nodes_path(), files.node_index_base)?;

    log::info!(
        "loaded reference topology from {}: {} vertices, {} faces, {} deformable nodes",
        files.dir.display(),
        vertices.len(),
        faces.len(),
        deform_nodes.len()
    );

    Ok(ReferenceTopology::new(vertices, faces, deform_nodes)?)
}

/// Reads `x,y,z` vertex rows.
pub fn read_vertices(path: &Path) -> AssetResult<Vec<Vec3>> {
    let rows = read_rows::<f32>(path, 3)?;
    rows.into_iter()
        .map(|(line, row)| {
            let v = [row[0], row[1], row[2]];
            if is_finite(v) {
                Ok(v)
            } else {
                Err(AssetError::parse(path, line, "vertex coordinate is not finite"))
            }
        })
        .collect()
}

/// Reads triangle rows and rebases them to 0-based indices.
pub fn read_faces(path: &Path, index_base: u32) -> AssetResult<Vec<Face>> {
    let rows = read_rows::<i64>(path, 3)?;
    rows.into_iter()
        .map(|(line, row)| {
            Ok([
                rebase(path, line, row[0], index_base)?,
                rebase(path, line, row[1], index_base)?,
                rebase(path, line, row[2], index_base)?,
            ])
        })
        .collect()
}

/// Reads a single-column index file and rebases it to 0-based indices.
pub fn read_indices(path: &Path, index_base: u32) -> AssetResult<Vec<u32>> {
    let rows = read_rows::<i64>(path, 1)?;
    rows.into_iter()
        .map(|(line, row)| rebase(path, line, row[0], index_base))
        .collect()
}

fn rebase(path: &Path, line: u64, value: i64, base: u32) -> AssetResult<u32> {
    let rebased = value - i64::from(base);
    if rebased < 0 {
        return Err(AssetError::BelowIndexBase {
            path: path.to_path_buf(),
            line,
            value,
            base,
        });
    }
    u32::try_from(rebased).map_err(|_| AssetError::parse(path, line, format!("index {} is too large", value)))
}

/// Reads a headerless CSV file into rows of exactly `columns` values, tagged
/// with their 1-based line number. Blank lines and trailing empty fields are
/// ignored.
fn read_rows<T: FromStr>(path: &Path, columns: usize) -> AssetResult<Vec<(u64, Vec<T>)>> {
    let file = File::open(path).map_err(|e| AssetError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|p| p.line()).unwrap_or(0);
            AssetError::parse(path, line, e.to_string())
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != columns {
            return Err(AssetError::ColumnCount {
                path: path.to_path_buf(),
                line,
                expected: columns,
                found: fields.len(),
            });
        }

        let values = fields
            .iter()
            .map(|f| {
                f.parse::<T>()
                    .map_err(|_| AssetError::parse(path, line, format!("'{}' is not a number", f)))
            })
            .collect::<AssetResult<Vec<T>>>()?;
        rows.push((line, values));
    }

    if rows.is_empty() {
        return Err(AssetError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CodedError, IndexKind, IntegrityError};
    use std::fs;

    fn write_assets(dir: &Path, vertices: &str, faces: &str, nodes: &str) -> AssetFiles {
        fs::write(dir.join(DEFAULT_VERTICES_FILE), vertices).unwrap();
        fs::write(dir.join(DEFAULT_FACES_FILE), faces).unwrap();
        fs::write(dir.join(DEFAULT_DEFORM_NODES_FILE), nodes).unwrap();
        AssetFiles::in_dir(dir)
    }

    #[test]
    fn test_load_rebases_indices() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_assets(
            tmp.path(),
            "0.0,0.0,0.0\n1.0,0.0,0.0\n0.0,1.0,0.0\n0.0,0.0,1.0\n",
            "1,2,3\n1,3,4\n",
            "2\n4\n",
        );
        let topology = files.load().unwrap();
        assert_eq!(topology.vertex_count(), 4);
        assert_eq!(topology.faces(), &[[0, 1, 2], [0, 2, 3]]);
        assert_eq!(topology.deform_nodes(), &[1, 3]);
    }

    #[test]
    fn test_blank_lines_and_whitespace() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_assets(
            tmp.path(),
            " 0.5 , 1.5 , -2.0 \n\n1,1,1,\n\n2,2,2\n",
            "1, 2, 3\n",
            "\n3\n",
        );
        let topology = files.load().unwrap();
        assert_eq!(topology.vertices()[0], [0.5, 1.5, -2.0]);
        assert_eq!(topology.vertex_count(), 3);
        assert_eq!(topology.deform_nodes(), &[2]);
    }

    #[test]
    fn test_zero_based_files() {
        let tmp = tempfile::tempdir().unwrap();
        let mut files = write_assets(tmp.path(), "0,0,0\n1,0,0\n0,1,0\n", "0,1,2\n", "0\n2\n");
        files.face_index_base = 0;
        files.node_index_base = 0;
        let topology = files.load().unwrap();
        assert_eq!(topology.faces(), &[[0, 1, 2]]);
        assert_eq!(topology.deform_nodes(), &[0, 2]);
    }

    #[test]
    fn test_wrong_column_count() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_assets(tmp.path(), "0,0,0\n1,0\n", "1,2,3\n", "1\n");
        let err = files.load().unwrap_err();
        assert!(matches!(
            err,
            AssetError::ColumnCount {
                line: 2,
                expected: 3,
                found: 2,
                ..
            }
        ));
        assert_eq!(err.code(), "ASSET_003");
    }

    #[test]
    fn test_index_below_base() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_assets(tmp.path(), "0,0,0\n1,0,0\n0,1,0\n", "0,1,2\n", "1\n");
        let err = files.load().unwrap_err();
        assert!(matches!(err, AssetError::BelowIndexBase { value: 0, base: 1, .. }));
    }

    #[test]
    fn test_deform_node_out_of_range_is_integrity_fault() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_assets(tmp.path(), "0,0,0\n1,0,0\n0,1,0\n", "1,2,3\n", "1\n4\n");
        let err = files.load().unwrap_err();
        match err {
            AssetError::Integrity(IntegrityError::IndexOutOfRange { kind, index, .. }) => {
                assert_eq!(kind, IndexKind::DeformNode);
                assert_eq!(index, 3);
            }
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_and_empty_files() {
        let tmp = tempfile::tempdir().unwrap();
        let err = AssetFiles::in_dir(tmp.path()).load().unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));

        let files = write_assets(tmp.path(), "\n\n", "1,2,3\n", "1\n");
        let err = files.load().unwrap_err();
        assert!(matches!(err, AssetError::Empty { .. }));
    }

    #[test]
    fn test_non_numeric_value() {
        let tmp = tempfile::tempdir().unwrap();
        let files = write_assets(tmp.path(), "0,0,0\n1,abc,0\n", "1,2,2\n", "1\n");
        let err = files.load().unwrap_err();
        assert!(matches!(err, AssetError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_resolved_joins_relative_dir() {
        let files = AssetFiles::in_dir("assets/ball").resolved(Path::new("/opt/ballnet"));
        assert_eq!(files.dir, PathBuf::from("/opt/ballnet/assets/ball"));
        let files = AssetFiles::in_dir("/abs").resolved(Path::new("/opt/ballnet"));
        assert_eq!(files.dir, PathBuf::from("/abs"));
    }
}
