//! Variants and the predictor that serves them.

use std::time::Instant;

use ballnet_core::{
    CodedError, DoubleSidedMesh, EnvelopeWarning, ForceResult, Manifest, MotionCommand,
    MotionLimits, ReferenceTopology, TopologyStats, VariantConfig,
};
use serde::Serialize;

use crate::error::{InferenceError, PredictError, PredictResult, VariantResult};
use crate::inference::{load_adapter, InferenceAdapter};
use crate::pipeline::PipelineConfig;

/// A loaded body variant: reference topology, model and pipeline settings.
pub struct Variant {
    name: String,
    topology: ReferenceTopology,
    adapter: Box<dyn InferenceAdapter>,
    pipeline: PipelineConfig,
}

impl std::fmt::Debug for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name)
            .field("model", &self.adapter.name())
            .field("vertices", &self.topology.vertex_count())
            .finish()
    }
}

impl Variant {
    /// Assembles a variant. Fails if the model's node count is known and
    /// disagrees with the topology.
    pub fn new(
        name: impl Into<String>,
        topology: ReferenceTopology,
        adapter: Box<dyn InferenceAdapter>,
        pipeline: PipelineConfig,
    ) -> VariantResult<Self> {
        if let Some(found) = adapter.node_count() {
            let expected = topology.deform_node_count();
            if found != expected {
                return Err(InferenceError::NodeCountMismatch { expected, found }.into());
            }
        }
        Ok(Self {
            name: name.into(),
            topology,
            adapter,
            pipeline,
        })
    }

    /// Loads a variant described by a manifest entry.
    pub fn load(manifest: &Manifest, config: &VariantConfig) -> VariantResult<Self> {
        let pipeline = PipelineConfig::from_settings(manifest.settings_for(config))?;
        let topology = config.assets.resolved(&manifest.base_dir).load()?;
        let adapter = load_adapter(&config.model.resolved(&manifest.base_dir))?;
        Self::new(config.name.clone(), topology, adapter, pipeline)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topology(&self) -> &ReferenceTopology {
        &self.topology
    }

    pub fn model_name(&self) -> &str {
        self.adapter.name()
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Runs one prediction. Non-finite motions are rejected before the model
    /// is called.
    pub fn predict(&self, motion: &MotionCommand) -> PredictResult<(ForceResult, DoubleSidedMesh)> {
        motion.validate()?;
        let start = Instant::now();
        let output = self.adapter.infer(&motion.to_model_input())?;
        let inferred = start.elapsed();

        let expected = self.topology.deform_node_count();
        if output.displacements.len() != expected {
            return Err(InferenceError::NodeCountMismatch {
                expected,
                found: output.displacements.len(),
            }
            .into());
        }

        let mesh = self.pipeline.synthesize(&self.topology, &output.displacements)?;
        log::debug!(
            "{}: inference {:.1} ms, synthesis {:.1} ms, {} vertices, {} faces",
            self.name,
            inferred.as_secs_f64() * 1000.0,
            (start.elapsed() - inferred).as_secs_f64() * 1000.0,
            mesh.vertex_count(),
            mesh.face_count()
        );
        Ok((output.force, mesh))
    }
}

enum Slot {
    Ready(Variant),
    Disabled { code: &'static str, reason: String },
}

/// Result of one prediction.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub variant: String,
    pub force: ForceResult,
    pub mesh: DoubleSidedMesh,
    /// Motion components outside the trained envelope.
    pub warnings: Vec<EnvelopeWarning>,
}

/// Load status of one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantStatus {
    pub name: String,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TopologyStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serves predictions for a set of named variants.
///
/// Variants are initialized once. A variant that fails to initialize is kept
/// as disabled with its reason; the others keep serving. The predictor is
/// read-only afterwards and can be shared across threads.
pub struct Predictor {
    slots: Vec<(String, Slot)>,
    limits: MotionLimits,
}

impl Predictor {
    /// An empty predictor with the given envelope.
    pub fn new(limits: MotionLimits) -> Self {
        Self {
            slots: Vec::new(),
            limits,
        }
    }

    /// Loads every variant of `manifest`, in manifest order.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut predictor = Self::new(manifest.motion_limits);
        for config in &manifest.variants {
            match Variant::load(manifest, config) {
                Ok(variant) => {
                    log::info!(
                        "variant {} ready: {} vertices, {} deformable nodes, model {}",
                        variant.name(),
                        variant.topology().vertex_count(),
                        variant.topology().deform_node_count(),
                        variant.model_name()
                    );
                    predictor.register(variant);
                }
                Err(e) => {
                    log::warn!("variant {} disabled: [{}] {}", config.name, e.code(), e);
                    predictor.disable(&config.name, &e);
                }
            }
        }
        predictor
    }

    /// Adds or replaces a ready variant.
    pub fn register(&mut self, variant: Variant) {
        let name = variant.name().to_string();
        self.insert(name, Slot::Ready(variant));
    }

    /// Records a variant as disabled.
    pub fn disable(&mut self, name: &str, error: &dyn CodedError) {
        self.insert(
            name.to_string(),
            Slot::Disabled {
                code: error.code(),
                reason: error.message(),
            },
        );
    }

    fn insert(&mut self, name: String, slot: Slot) {
        match self.slots.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = slot,
            None => self.slots.push((name, slot)),
        }
    }

    pub fn limits(&self) -> &MotionLimits {
        &self.limits
    }

    /// Names of all variants, ready or not, in registration order.
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    /// The first ready variant.
    pub fn default_variant(&self) -> Option<&str> {
        self.slots.iter().find_map(|(name, slot)| match slot {
            Slot::Ready(_) => Some(name.as_str()),
            Slot::Disabled { .. } => None,
        })
    }

    /// A ready variant by name.
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.slots.iter().find_map(|(n, slot)| match slot {
            Slot::Ready(variant) if n == name => Some(variant),
            _ => None,
        })
    }

    /// Load status of every variant.
    pub fn status(&self) -> Vec<VariantStatus> {
        self.slots
            .iter()
            .map(|(name, slot)| match slot {
                Slot::Ready(variant) => VariantStatus {
                    name: name.clone(),
                    ready: true,
                    model: Some(variant.model_name().to_string()),
                    stats: Some(variant.topology().stats()),
                    error_code: None,
                    error: None,
                },
                Slot::Disabled { code, reason } => VariantStatus {
                    name: name.clone(),
                    ready: false,
                    model: None,
                    stats: None,
                    error_code: Some(code.to_string()),
                    error: Some(reason.clone()),
                },
            })
            .collect()
    }

    /// Predicts the force and deformed mesh for `motion` on `variant`.
    ///
    /// The motion is validated before the model is called. Motions outside
    /// the trained envelope are still predicted and reported in
    /// [`Prediction::warnings`].
    pub fn predict(&self, motion: &MotionCommand, variant: &str) -> PredictResult<Prediction> {
        motion.validate()?;

        let slot = self
            .slots
            .iter()
            .find(|(name, _)| name == variant)
            .map(|(_, slot)| slot)
            .ok_or_else(|| PredictError::UnknownVariant {
                name: variant.to_string(),
            })?;
        let loaded = match slot {
            Slot::Ready(loaded) => loaded,
            Slot::Disabled { reason, .. } => {
                return Err(PredictError::VariantUnavailable {
                    name: variant.to_string(),
                    reason: reason.clone(),
                })
            }
        };

        let warnings = self.limits.check(motion);
        for warning in &warnings {
            log::warn!("{}: {}", variant, warning);
        }

        let (force, mesh) = loaded.predict(motion)?;
        Ok(Prediction {
            variant: variant.to_string(),
            force,
            mesh,
            warnings,
        })
    }
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(MotionLimits::default())
    }
}
