//! The reconstruction pipeline for one variant.

use ballnet_core::{
    ConfigResult, DoubleSidedMesh, FrameCorrection, IntegrityResult, PipelineSettings,
    ReferenceTopology, SparseDisplacementField,
};

use crate::colormap::{ColorMapper, Colormap};
use crate::reconstruct::reconstruct;
use crate::synth::{build_deformed_mesh, make_double_sided};

/// Immutable pipeline configuration: colormap, color range and frame
/// correction. Built once per variant and injected into every prediction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineConfig {
    mapper: ColorMapper,
    frame: FrameCorrection,
}

impl PipelineConfig {
    pub fn new(mapper: ColorMapper, frame: FrameCorrection) -> ConfigResult<Self> {
        frame.validate()?;
        Ok(Self { mapper, frame })
    }

    /// Builds a configuration from manifest settings, checking the color
    /// range, colormap and frame correction.
    pub fn from_settings(settings: &PipelineSettings) -> ConfigResult<Self> {
        let range = settings.color_range.to_range()?;
        let colormap = Colormap::from_spec(&settings.colormap)?;
        Self::new(ColorMapper::new(range, colormap), settings.frame_correction)
    }

    pub fn mapper(&self) -> &ColorMapper {
        &self.mapper
    }

    pub fn frame(&self) -> &FrameCorrection {
        &self.frame
    }

    /// Sparse node displacements to a colored double-sided mesh: scatter,
    /// color, correct the frame, then duplicate back-to-back.
    pub fn synthesize(
        &self,
        topology: &ReferenceTopology,
        sparse: &SparseDisplacementField,
    ) -> IntegrityResult<DoubleSidedMesh> {
        let dense = reconstruct(topology, sparse)?;
        let mesh = build_deformed_mesh(topology, &dense, &self.mapper, &self.frame)?;
        make_double_sided(&mesh)
    }
}
