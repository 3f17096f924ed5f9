//! Inspect command implementation
//!
//! Loads every variant of the manifest and reports its status.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use ballnet_core::Manifest;
use ballnet_pipeline::{Predictor, VariantStatus};
use colored::Colorize;

use super::json_output::{print_json, InspectOutput, JsonError};

/// Run the inspect command
///
/// # Returns
/// Exit code: 0 if at least one variant is ready, 1 otherwise
pub fn run(config: Option<&Path>, json_output: bool) -> Result<ExitCode> {
    let path = Manifest::locate(config);
    let loaded = Manifest::from_path(&path);

    if json_output {
        let output = match &loaded {
            Ok(manifest) => {
                let variants = Predictor::from_manifest(manifest).status();
                InspectOutput {
                    success: variants.iter().any(|v| v.ready),
                    manifest: path.display().to_string(),
                    variants,
                    errors: Vec::new(),
                }
            }
            Err(e) => InspectOutput {
                success: false,
                manifest: path.display().to_string(),
                variants: Vec::new(),
                errors: vec![JsonError::from_coded(e)],
            },
        };
        print_json(&output)?;
        return Ok(exit_code(output.success));
    }

    println!("{} {}", "Manifest:".cyan().bold(), path.display());
    let manifest =
        loaded.with_context(|| format!("Failed to load manifest: {}", path.display()))?;
    let statuses = Predictor::from_manifest(&manifest).status();

    println!();
    for status in &statuses {
        print_status(status);
    }

    let ready = statuses.iter().filter(|s| s.ready).count();
    println!();
    println!("{} of {} variants ready", ready, statuses.len());
    Ok(exit_code(ready > 0))
}

fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn print_status(status: &VariantStatus) {
    if !status.ready {
        println!(
            "  {} {} disabled: [{}] {}",
            "!!".red(),
            status.name.bold(),
            status.error_code.as_deref().unwrap_or("?"),
            status.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }

    println!(
        "  {} {} (model {})",
        "ok".green(),
        status.name.bold(),
        status.model.as_deref().unwrap_or("?")
    );
    if let Some(stats) = &status.stats {
        println!(
            "     {} vertices, {} faces, {} deformable nodes",
            stats.vertex_count, stats.face_count, stats.deform_node_count
        );
        if stats.duplicate_deform_nodes > 0 {
            println!(
                "     {} {} repeated deformable-node indices (displacements accumulate)",
                "!!".yellow(),
                stats.duplicate_deform_nodes
            );
        }
        if let Some(bounds) = &stats.bounds {
            let size = bounds.size();
            let extent = format!("extent {:.3} x {:.3} x {:.3}", size[0], size[1], size[2]);
            println!("     {}", extent.as_str().dimmed());
        }
    }
}
