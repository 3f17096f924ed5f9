//! GLB export checked with an independent glTF reader.
//!
//! ```bash
//! cargo test -p ballnet-tests --test glb_export
//! ```

use std::fs;

use ballnet_core::{DoubleSidedMesh, Manifest, MotionCommand};
use ballnet_pipeline::{export_glb_to_path, export_glb_to_temp, ExportOptions, Predictor};
use ballnet_tests::{read_glb_mesh, validate_glb, BallFixture};
use pretty_assertions::assert_eq;

fn predicted_mesh(dz: f64) -> DoubleSidedMesh {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = Predictor::from_manifest(&Manifest::from_path(&manifest).unwrap());
    let motion = MotionCommand::new(0.0, 0.0, dz, 0.0, 0.0, 0.0).unwrap();
    predictor.predict(&motion, "BallNet").unwrap().mesh
}

#[test]
fn exported_glb_round_trips_through_gltf_reader() {
    let mesh = predicted_mesh(-1.5);
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("ball.glb");

    export_glb_to_path(&mesh, &path, &ExportOptions::default()).unwrap();
    let data = fs::read(&path).unwrap();

    let info = validate_glb(&data).unwrap();
    assert_eq!(info.version, 2);
    assert_eq!(info.num_chunks, 2);
    assert_eq!(info.length as usize, data.len());

    let read = read_glb_mesh(&data).unwrap();
    assert_eq!(read.positions, mesh.positions());
    assert_eq!(read.colors, mesh.colors());
    assert_eq!(read.faces, mesh.faces());
    assert_eq!(read.normals, None);
    assert_eq!(read.material_count, 1);
    assert!(read
        .generator
        .as_deref()
        .unwrap_or_default()
        .starts_with("ballnet-pipeline"));
}

#[test]
fn normals_are_unit_length_when_requested() {
    let mesh = predicted_mesh(-1.0);
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("ball.glb");

    export_glb_to_path(&mesh, &path, &ExportOptions::default().with_normals(true)).unwrap();
    let read = read_glb_mesh(&fs::read(&path).unwrap()).unwrap();

    let normals = read.normals.expect("normals requested");
    assert_eq!(normals.len(), mesh.vertex_count());
    for n in normals {
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        assert!((len - 1.0).abs() < 1e-4, "normal {:?} has length {}", n, len);
    }
}

#[test]
fn export_overwrites_existing_file() {
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("ball.glb");
    fs::write(&path, b"stale").unwrap();

    export_glb_to_path(&predicted_mesh(0.0), &path, &ExportOptions::default()).unwrap();
    let data = fs::read(&path).unwrap();
    assert!(validate_glb(&data).is_ok());
}

#[test]
fn temp_export_is_content_addressed() {
    let options = ExportOptions::default();
    let first = export_glb_to_temp(&predicted_mesh(-1.0), &options).unwrap();
    let again = export_glb_to_temp(&predicted_mesh(-1.0), &options).unwrap();
    let other = export_glb_to_temp(&predicted_mesh(-2.0), &options).unwrap();

    assert_eq!(first, again);
    assert_ne!(first, other);
    assert!(first.exists());
    assert_eq!(first.extension().and_then(|e| e.to_str()), Some("glb"));
    assert!(validate_glb(&fs::read(&other).unwrap()).is_ok());
}
