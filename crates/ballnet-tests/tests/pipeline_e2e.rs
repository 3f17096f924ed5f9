//! End-to-end prediction tests on the synthetic ball.
//!
//! ```bash
//! cargo test -p ballnet-tests --test pipeline_e2e
//! ```

use ballnet_core::{Manifest, MotionCommand, Vec3};
use ballnet_pipeline::{ColorMapper, PredictError, Predictor};
use ballnet_tests::fixtures::{
    linear_variant, press_weights, BallFixture, DEFORM_NODES, OCTAHEDRON_FACES,
    OCTAHEDRON_VERTICES,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn load(manifest: &std::path::Path) -> Predictor {
    Predictor::from_manifest(&Manifest::from_path(manifest).unwrap())
}

fn press(dz: f64) -> MotionCommand {
    MotionCommand::new(0.0, 0.0, dz, 0.0, 0.0, 0.0).unwrap()
}

fn assert_close(a: Vec3, b: Vec3) {
    for axis in 0..3 {
        assert!(
            (a[axis] - b[axis]).abs() < 1e-5,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }
}

/// `(x, y, z) -> (x, z, -y)`
fn to_render(v: Vec3) -> Vec3 {
    [v[0], v[2], -v[1]]
}

#[test]
fn zero_motion_returns_rotated_reference() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);

    let prediction = predictor.predict(&MotionCommand::zero(), "BallNet").unwrap();

    assert_eq!(prediction.force.to_array(), [0.0; 6]);
    assert!(prediction.warnings.is_empty());
    assert_eq!(prediction.mesh.vertex_count(), 12);
    assert_eq!(prediction.mesh.face_count(), 16);

    let rest = ColorMapper::default().color_for(0.0);
    for (i, reference) in OCTAHEDRON_VERTICES.iter().enumerate() {
        assert_close(prediction.mesh.positions()[i], to_render(*reference));
        assert_eq!(prediction.mesh.colors()[i], rest);
    }
}

#[test]
fn press_moves_only_deformable_nodes() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);

    let prediction = predictor.predict(&press(-2.0), "BallNet").unwrap();
    assert_eq!(prediction.force.fz, 5.0);

    let mapper = ColorMapper::default();
    let mesh = &prediction.mesh;
    for (i, reference) in OCTAHEDRON_VERTICES.iter().enumerate() {
        if DEFORM_NODES.contains(&(i as u32)) {
            let moved = [reference[0], reference[1], reference[2] - 2.0];
            assert_close(mesh.positions()[i], to_render(moved));
            assert_eq!(mesh.colors()[i], mapper.color_for(2.0));
        } else {
            assert_close(mesh.positions()[i], to_render(*reference));
            assert_eq!(mesh.colors()[i], mapper.color_for(0.0));
        }
    }
}

#[test]
fn back_faces_mirror_front_faces() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);
    let mesh = predictor.predict(&press(-1.0), "BallNet").unwrap().mesh;

    let n = OCTAHEDRON_VERTICES.len() as u32;
    assert_eq!(mesh.front_faces(), &OCTAHEDRON_FACES[..]);
    for (front, back) in mesh.front_faces().iter().zip(mesh.back_faces()) {
        assert_eq!(*back, [front[2] + n, front[1] + n, front[0] + n]);
    }

    let half = mesh.front_vertex_count();
    assert_eq!(&mesh.positions()[..half], &mesh.positions()[half..]);
    assert_eq!(&mesh.colors()[..half], &mesh.colors()[half..]);
}

#[test]
fn out_of_envelope_motion_is_predicted_with_warning() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);

    let prediction = predictor.predict(&press(-5.0), "BallNet").unwrap();
    assert_eq!(prediction.warnings.len(), 1);
    assert_eq!(prediction.warnings[0].component, "dz");
    assert_eq!(prediction.force.fz, 12.5);
}

#[test]
fn non_finite_motion_is_rejected_before_inference() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);

    let mut motion = MotionCommand::zero();
    motion.rx = f64::NAN;
    let err = predictor.predict(&motion, "BallNet").unwrap_err();
    assert!(matches!(err, PredictError::InvalidMotion(_)));
}

#[test]
fn rotation_reaches_model_in_radians() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);

    let motion = MotionCommand::new(0.0, 0.0, 0.0, 0.0, 0.0, 90.0).unwrap();
    let prediction = predictor.predict(&motion, "BallNet").unwrap();
    assert!((prediction.force.tz - std::f64::consts::FRAC_PI_2).abs() < 1e-6);
}

#[test]
fn repeated_deformable_nodes_accumulate() {
    let fixture = BallFixture::new();
    let (vertices, faces, _) = ballnet_tests::fixtures::octahedron_files();
    // Vertex 5 (1-based) listed twice.
    fixture.write_assets("ball", &vertices, &faces, "5\n5\n1\n");
    fixture.add_linear_model("ball/model.json", &press_weights(3));
    let manifest = fixture.write_manifest(&json!({
        "variants": [linear_variant("BallNet", "ball", "ball/model.json")]
    }));
    let predictor = load(&manifest);

    let mesh = predictor.predict(&press(-1.0), "BallNet").unwrap().mesh;
    assert_close(mesh.positions()[4], to_render([0.0, 0.0, 8.0]));
    assert_close(mesh.positions()[0], to_render([10.0, 0.0, -1.0]));

    let status = predictor.status();
    assert_eq!(status[0].stats.as_ref().unwrap().duplicate_deform_nodes, 1);
}

#[test]
fn identity_frame_override_keeps_model_frame() {
    let fixture = BallFixture::new();
    fixture.add_ball("ball");
    fixture.add_linear_model("ball/model.json", &press_weights(DEFORM_NODES.len()));
    let mut variant = linear_variant("BallNet", "ball", "ball/model.json");
    variant["pipeline"] = json!({ "frame_correction": { "kind": "identity" } });
    let manifest = fixture.write_manifest(&json!({ "variants": [variant] }));
    let predictor = load(&manifest);

    let mesh = predictor.predict(&press(-2.0), "BallNet").unwrap().mesh;
    assert_close(mesh.positions()[4], [0.0, 0.0, 8.0]);
    assert_close(mesh.positions()[2], [0.0, 10.0, 0.0]);
}

#[test]
fn narrow_color_range_saturates() {
    let fixture = BallFixture::new();
    fixture.add_ball("ball");
    fixture.add_linear_model("ball/model.json", &press_weights(DEFORM_NODES.len()));
    let manifest = fixture.write_manifest(&json!({
        "pipeline": { "color_range": { "min": 0.0, "max": 1.0 } },
        "variants": [linear_variant("BallNet", "ball", "ball/model.json")]
    }));
    let predictor = load(&manifest);

    let mesh = predictor.predict(&press(-2.0), "BallNet").unwrap().mesh;
    let top = ColorMapper::default().colormap().sample_rgba8(1.0);
    assert_eq!(mesh.colors()[4], top);
    assert_eq!(mesh.colors()[0], top);
}

#[test]
fn predictor_serves_concurrent_requests() {
    let (_fixture, manifest) = BallFixture::single_variant();
    let predictor = load(&manifest);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let predictor = &predictor;
                scope.spawn(move || predictor.predict(&press(-(i as f64) * 0.5), "BallNet"))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let prediction = handle.join().unwrap().unwrap();
            assert_eq!(prediction.force.fz, 2.5 * i as f64 * 0.5);
        }
    });
}
