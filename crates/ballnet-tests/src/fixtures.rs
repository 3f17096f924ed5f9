//! Test fixture utilities for creating synthetic ball variants.
//!
//! The synthetic ball is a radius-10 octahedron. Three of its six vertices
//! are deformable; the other three must never move.

use std::fs;
use std::path::{Path, PathBuf};

use ballnet_core::{Face, Vec3};
use ballnet_pipeline::inference::LinearWeights;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Reference vertices of the synthetic ball (0-based order).
pub const OCTAHEDRON_VERTICES: [Vec3; 6] = [
    [10.0, 0.0, 0.0],
    [-10.0, 0.0, 0.0],
    [0.0, 10.0, 0.0],
    [0.0, -10.0, 0.0],
    [0.0, 0.0, 10.0],
    [0.0, 0.0, -10.0],
];

/// Triangles of the synthetic ball (0-based).
pub const OCTAHEDRON_FACES: [Face; 8] = [
    [0, 2, 4],
    [2, 1, 4],
    [1, 3, 4],
    [3, 0, 4],
    [2, 0, 5],
    [1, 2, 5],
    [3, 1, 5],
    [0, 3, 5],
];

/// Deformable-node vertex indices (0-based).
pub const DEFORM_NODES: [u32; 3] = [4, 0, 1];

/// Force output per mm of `dz` on the `Fz` channel.
pub const FZ_PER_MM: f32 = -2.5;

/// A temporary directory holding assets, models and a manifest.
pub struct BallFixture {
    pub root: TempDir,
}

impl BallFixture {
    /// Create a new empty fixture.
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    /// A fixture with one working variant named `BallNet` and its manifest.
    pub fn single_variant() -> (Self, PathBuf) {
        let fixture = Self::new();
        fixture.add_ball("ball");
        fixture.add_linear_model("ball/model.json", &press_weights(DEFORM_NODES.len()));
        let manifest = fixture.write_manifest(&json!({
            "variants": [linear_variant("BallNet", "ball", "ball/model.json")]
        }));
        (fixture, manifest)
    }

    /// Get the fixture root path.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Writes the octahedron assets, 1-based, into `dir`.
    pub fn add_ball(&self, dir: &str) -> PathBuf {
        let (vertices, faces, nodes) = octahedron_files();
        self.write_assets(dir, &vertices, &faces, &nodes)
    }

    /// Writes asset files with the given contents into `dir`.
    pub fn write_assets(&self, dir: &str, vertices: &str, faces: &str, nodes: &str) -> PathBuf {
        let dir = self.path().join(dir);
        fs::create_dir_all(&dir).expect("Failed to create asset dir");
        fs::write(dir.join("surface_coordinate.txt"), vertices).expect("Failed to write vertices");
        fs::write(dir.join("surface_triangle.txt"), faces).expect("Failed to write faces");
        fs::write(dir.join("deform_node.txt"), nodes).expect("Failed to write deform nodes");
        dir
    }

    /// Writes linear model weights to `rel_path`.
    pub fn add_linear_model(&self, rel_path: &str, weights: &LinearWeights) -> PathBuf {
        let path = self.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create model dir");
        }
        let json = serde_json::to_string_pretty(weights).expect("Failed to serialize weights");
        fs::write(&path, json).expect("Failed to write model");
        path
    }

    /// Writes `ballnet.json` at the fixture root.
    pub fn write_manifest(&self, manifest: &Value) -> PathBuf {
        let path = self.path().join("ballnet.json");
        let json = serde_json::to_string_pretty(manifest).expect("Failed to serialize manifest");
        fs::write(&path, json).expect("Failed to write manifest");
        path
    }
}

impl Default for BallFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// The octahedron as file contents: comma-separated vertices, 1-based
/// triangles and 1-based deformable nodes.
pub fn octahedron_files() -> (String, String, String) {
    let vertices = OCTAHEDRON_VERTICES
        .iter()
        .map(|v| format!("{},{},{}\n", v[0], v[1], v[2]))
        .collect();
    let faces = OCTAHEDRON_FACES
        .iter()
        .map(|f| format!("{},{},{}\n", f[0] + 1, f[1] + 1, f[2] + 1))
        .collect();
    let nodes = DEFORM_NODES.iter().map(|n| format!("{}\n", n + 1)).collect();
    (vertices, faces, nodes)
}

/// Weights of a "press" model: every deformable node moves along the model
/// `z` axis by `dz`, `Fz = FZ_PER_MM * dz` and `Tz` equals `rz` in radians.
pub fn press_weights(node_count: usize) -> LinearWeights {
    let mut weights = LinearWeights::zeros(node_count);
    weights.force_weights[2][2] = FZ_PER_MM;
    weights.force_weights[5][5] = 1.0;
    for node in 0..node_count {
        weights.node_weights[node * 3 + 2][2] = 1.0;
    }
    weights
}

/// Manifest entry for a variant backed by a linear model.
pub fn linear_variant(name: &str, assets_dir: &str, model: &str) -> Value {
    json!({
        "name": name,
        "assets": { "dir": assets_dir },
        "model": { "kind": "linear", "path": model }
    })
}
