//! BallNet Deformation Pipeline
//!
//! This crate turns a motion command into a predicted reaction force and a
//! renderable deformed surface.
//!
//! # Architecture
//!
//! ```text
//! MotionCommand -> InferenceAdapter -> (ForceResult, SparseDisplacementField)
//!                                                     |
//!                                   reconstruct (scatter onto N_ref vertices)
//!                                                     |
//!                       ColorMapper (magnitudes)   FrameCorrection (positions)
//!                                                     |
//!                              make_double_sided -> DoubleSidedMesh -> GLB
//! ```
//!
//! Every stage after the adapter is a pure function of its inputs and of the
//! immutable [`PipelineConfig`] of the variant.
//!
//! # Example
//!
//! ```
//! use ballnet_core::{MotionCommand, ReferenceTopology};
//! use ballnet_pipeline::inference::{LinearModel, LinearWeights};
//! use ballnet_pipeline::{PipelineConfig, Predictor, Variant};
//!
//! let topology = ReferenceTopology::new(
//!     vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
//!     vec![[0, 1, 2]],
//!     vec![1],
//! )
//! .unwrap();
//! let model = LinearModel::from_weights("zero", LinearWeights::zeros(1)).unwrap();
//! let variant = Variant::new("BallNet", topology, Box::new(model), PipelineConfig::default()).unwrap();
//!
//! let mut predictor = Predictor::default();
//! predictor.register(variant);
//! let prediction = predictor.predict(&MotionCommand::zero(), "BallNet").unwrap();
//! assert_eq!(prediction.mesh.vertex_count(), 6);
//! ```

pub mod colormap;
pub mod error;
pub mod export;
pub mod frame;
pub mod inference;
pub mod pipeline;
pub mod predictor;
pub mod reconstruct;
pub mod synth;

pub use colormap::{ColorMapper, Colormap};
pub use error::{
    ExportError, ExportResult, InferenceError, InferenceResult, PredictError, PredictResult,
    VariantError, VariantResult,
};
pub use export::{build_glb, export_glb_to_path, export_glb_to_temp, ExportOptions};
pub use inference::{InferenceAdapter, InferenceOutput};
pub use pipeline::PipelineConfig;
pub use predictor::{Prediction, Predictor, Variant, VariantStatus};
pub use reconstruct::{reconstruct, scatter};
pub use synth::{build_deformed_mesh, make_double_sided};
