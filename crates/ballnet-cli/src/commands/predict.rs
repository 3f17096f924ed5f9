//! Predict command implementation
//!
//! Runs one prediction and writes the deformed mesh as a GLB file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use ballnet_core::{ForceResult, Manifest, MotionCommand, MotionResult, FORCE_LABELS};
use ballnet_pipeline::{
    export_glb_to_path, export_glb_to_temp, ExportOptions, Prediction, Predictor,
};
use clap::Args;
use colored::Colorize;

use super::json_output::{error_codes, print_json, JsonError, MeshSummary, PredictOutput};

/// Motion given either component-wise or as one comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Args)]
pub struct MotionArgs {
    /// Translation along X in mm
    #[arg(long, allow_hyphen_values = true, conflicts_with = "motion")]
    pub dx: Option<f64>,

    /// Translation along Y in mm
    #[arg(long, allow_hyphen_values = true, conflicts_with = "motion")]
    pub dy: Option<f64>,

    /// Translation along Z in mm
    #[arg(long, allow_hyphen_values = true, conflicts_with = "motion")]
    pub dz: Option<f64>,

    /// Rotation about X in degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "motion")]
    pub rx: Option<f64>,

    /// Rotation about Y in degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "motion")]
    pub ry: Option<f64>,

    /// Rotation about Z in degrees
    #[arg(long, allow_hyphen_values = true, conflicts_with = "motion")]
    pub rz: Option<f64>,

    /// All six components as "dx,dy,dz,rx,ry,rz"
    #[arg(long, allow_hyphen_values = true)]
    pub motion: Option<String>,
}

impl MotionArgs {
    /// Builds the motion command. Missing components default to zero.
    pub fn to_command(&self) -> MotionResult<MotionCommand> {
        match &self.motion {
            Some(text) => MotionCommand::parse_csv(text),
            None => MotionCommand::new(
                self.dx.unwrap_or(0.0),
                self.dy.unwrap_or(0.0),
                self.dz.unwrap_or(0.0),
                self.rx.unwrap_or(0.0),
                self.ry.unwrap_or(0.0),
                self.rz.unwrap_or(0.0),
            ),
        }
    }
}

struct Predicted {
    prediction: Prediction,
    model: String,
    path: PathBuf,
}

/// Run the predict command
///
/// # Arguments
/// * `config` - Manifest path override
/// * `motion` - Motion arguments
/// * `variant` - Variant name (default: first ready variant)
/// * `out` - GLB output path (default: a transient file in the temp directory)
/// * `normals` - Whether to include vertex normals
/// * `json_output` - Whether to output machine-readable JSON
///
/// # Returns
/// Exit code: 0 on success, 1 on failure
pub fn run(
    config: Option<&Path>,
    motion: &MotionArgs,
    variant: Option<&str>,
    out: Option<&Path>,
    normals: bool,
    json_output: bool,
) -> Result<ExitCode> {
    let result = execute(config, motion, variant, out, normals);
    if json_output {
        let output = match result {
            Ok(done) => PredictOutput {
                success: true,
                variant: Some(done.prediction.variant.clone()),
                force: Some(done.prediction.force),
                mesh: Some(MeshSummary {
                    path: done.path.display().to_string(),
                    vertex_count: done.prediction.mesh.vertex_count(),
                    face_count: done.prediction.mesh.face_count(),
                    bounds: done.prediction.mesh.bounds(),
                }),
                warnings: done
                    .prediction
                    .warnings
                    .iter()
                    .map(|w| w.to_string())
                    .collect(),
                errors: Vec::new(),
            },
            Err(error) => PredictOutput::failure(error),
        };
        print_json(&output)?;
        return Ok(if output.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    let done = result.map_err(|e| anyhow::anyhow!("[{}] {}", e.code, e.message))?;
    print_human(&done);
    Ok(ExitCode::SUCCESS)
}

fn execute(
    config: Option<&Path>,
    motion: &MotionArgs,
    variant: Option<&str>,
    out: Option<&Path>,
    normals: bool,
) -> std::result::Result<Predicted, JsonError> {
    let motion = motion.to_command().map_err(|e| JsonError::from_coded(&e))?;

    let path = Manifest::locate(config);
    log::debug!("using manifest {}", path.display());
    let manifest = Manifest::from_path(&path).map_err(|e| JsonError::from_coded(&e))?;
    let predictor = Predictor::from_manifest(&manifest);

    let name = match variant {
        Some(name) => name,
        None => predictor.default_variant().ok_or_else(|| {
            JsonError::new(
                error_codes::NO_VARIANT,
                format!("no variant in {} could be loaded", path.display()),
            )
        })?,
    };

    let prediction = predictor
        .predict(&motion, name)
        .map_err(|e| JsonError::from_coded(&e))?;
    let model = predictor
        .variant(name)
        .map(|v| v.model_name().to_string())
        .unwrap_or_default();

    let options = ExportOptions::default().with_normals(normals);
    let path = match out {
        Some(out) => {
            export_glb_to_path(&prediction.mesh, out, &options)
                .map_err(|e| JsonError::from_coded(&e))?;
            out.to_path_buf()
        }
        None => export_glb_to_temp(&prediction.mesh, &options)
            .map_err(|e| JsonError::from_coded(&e))?,
    };

    Ok(Predicted {
        prediction,
        model,
        path,
    })
}

/// Formats the force table: one `label  value` row per component, values
/// with three decimals.
pub fn force_table(force: &ForceResult) -> Vec<String> {
    FORCE_LABELS
        .iter()
        .zip(force.formatted())
        .map(|(label, value)| format!("{:<9} {:>12}", label, value))
        .collect()
}

fn print_human(done: &Predicted) {
    let prediction = &done.prediction;
    let model = format!("(model {})", done.model);
    println!(
        "{} {} {}",
        "Predicting:".cyan().bold(),
        prediction.variant,
        model.dimmed()
    );

    for warning in &prediction.warnings {
        println!("  {} {}", "!!".yellow(), warning);
    }
    if !prediction.warnings.is_empty() {
        println!(
            "     {}",
            "Results outside the trained range are extrapolated.".dimmed()
        );
    }

    println!();
    println!("{}", "Force:".bold());
    for row in force_table(&prediction.force) {
        println!("  {}", row);
    }

    println!();
    println!(
        "{} {} ({} vertices, {} faces)",
        "Mesh:".bold(),
        done.path.display(),
        prediction.mesh.vertex_count(),
        prediction.mesh.face_count()
    );
    println!("{} Prediction complete", "ok".green());
}
