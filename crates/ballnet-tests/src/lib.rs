//! BallNet End-to-End Test Infrastructure
//!
//! This crate provides integration tests for the prediction flow:
//!
//! - Assets: surface files -> validated reference topology
//! - Prediction: motion -> force + double-sided colored mesh
//! - Export: mesh -> GLB, read back with an independent glTF loader
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all in-process tests (no Python required)
//! cargo test -p ballnet-tests
//!
//! # Run runner-process tests (requires a Python interpreter)
//! BALLNET_RUN_RUNTIME_TESTS=1 cargo test -p ballnet-tests -- --ignored
//! ```

pub mod fixtures;
pub mod format_validators;
pub mod harness;

pub use fixtures::BallFixture;
pub use format_validators::{read_glb_mesh, validate_glb, FormatError, GlbInfo, GlbMesh};
