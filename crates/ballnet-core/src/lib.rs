//! BallNet Core Library
//!
//! Data model shared by the BallNet deformation pipeline: the reference
//! topology of a deformable body, motion commands, force results,
//! displacement fields, renderable meshes, and the manifest describing which
//! body variants a process serves.
//!
//! # Overview
//!
//! A prediction starts from a [`MotionCommand`] (three translations in
//! millimeters, three rotations in degrees). An inference model turns it into
//! a [`ForceResult`] and a [`SparseDisplacementField`] with one vector per
//! deformable node. The pipeline crate scatters that field onto the
//! [`ReferenceTopology`], colors it and emits a [`DoubleSidedMesh`].
//!
//! # Example
//!
//! ```
//! use ballnet_core::{MotionCommand, MotionLimits};
//!
//! let motion = MotionCommand::new(2.0, 0.0, -1.0, 0.0, 45.0, 0.0).unwrap();
//! let warnings = MotionLimits::default().check(&motion);
//! assert_eq!(warnings.len(), 1);
//! assert_eq!(warnings[0].component, "ry");
//! ```
//!
//! # Modules
//!
//! - [`assets`]: Reading the per-variant text files
//! - [`config`]: Pipeline settings and the variant manifest
//! - [`error`]: Error types with stable codes
//! - [`field`]: Sparse and dense displacement fields
//! - [`geometry`]: Small vector helpers and bounding boxes
//! - [`mesh`]: Deformed and double-sided meshes
//! - [`motion`]: Motion commands, force results and the trained envelope
//! - [`topology`]: Validated reference topology

pub mod assets;
pub mod config;
pub mod error;
pub mod field;
pub mod geometry;
pub mod mesh;
pub mod motion;
pub mod topology;

pub use assets::{load_topology, AssetFiles};
pub use config::{
    ColorBounds, ColorRange, ColormapSpec, FrameCorrection, Manifest, ModelDescriptor,
    PipelineSettings, VariantConfig,
};
pub use error::{
    AssetError, AssetResult, CodedError, ConfigError, ConfigResult, IndexKind, IntegrityError,
    IntegrityResult, MotionError, MotionResult,
};
pub use field::{DenseDisplacementField, SparseDisplacementField};
pub use geometry::{BoundingBox, Vec3};
pub use mesh::{DeformedMesh, DoubleSidedMesh, Rgba};
pub use motion::{
    EnvelopeWarning, ForceResult, Interval, ModelInput, MotionCommand, MotionLimits,
    FORCE_LABELS, MOTION_COMPONENTS,
};
pub use topology::{Face, ReferenceTopology, TopologyStats};
