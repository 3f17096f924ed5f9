//! Doctor command implementation
//!
//! Checks the manifest, asset files and model runtimes without running a
//! prediction.

use std::path::Path;
use std::process::{Command, ExitCode};

use anyhow::Result;
use ballnet_core::{Manifest, ModelDescriptor, VariantConfig};
use ballnet_pipeline::inference::find_interpreter;
use colored::Colorize;

use super::json_output::{print_json, DoctorCheck, DoctorOutput};

/// A check together with the report section it belongs to.
struct Finding {
    section: &'static str,
    check: DoctorCheck,
}

impl Finding {
    fn ok(section: &'static str, name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            section,
            check: DoctorCheck {
                name: name.into(),
                ok: true,
                warning: false,
                detail: detail.into(),
            },
        }
    }

    fn fail(section: &'static str, name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            section,
            check: DoctorCheck {
                name: name.into(),
                ok: false,
                warning: false,
                detail: detail.into(),
            },
        }
    }

    fn warn(section: &'static str, name: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut finding = Self::fail(section, name, detail);
        finding.check.warning = true;
        finding
    }

    fn passes(&self) -> bool {
        self.check.ok || self.check.warning
    }
}

/// Run the doctor command
///
/// Checks:
/// - Manifest location and contents
/// - Asset files of every variant
/// - Model files, and for subprocess models the interpreter and its packages
///
/// # Returns
/// Exit code: 0 if all checks pass, 1 if any fail
pub fn run(config: Option<&Path>, json_output: bool) -> Result<ExitCode> {
    let findings = collect(config);
    let all_ok = findings.iter().all(Finding::passes);

    if json_output {
        let output = DoctorOutput {
            success: all_ok,
            checks: findings.into_iter().map(|f| f.check).collect(),
        };
        print_json(&output)?;
        return Ok(if all_ok {
            ExitCode::SUCCESS
        } else {
            ExitCode::from(1)
        });
    }

    println!("{}", "BallNet Doctor".cyan().bold());
    println!("{}", "==============".cyan());
    println!();

    println!("{}", "Versions:".bold());
    println!(
        "  {} ballnet-cli v{}",
        "->".green(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    let mut section = "";
    for finding in &findings {
        if finding.section != section {
            if !section.is_empty() {
                println!();
            }
            section = finding.section;
            println!("{}{}", section.bold(), ":".bold());
        }
        let mark = if finding.check.ok {
            "ok".green()
        } else if finding.check.warning {
            "!!".yellow()
        } else {
            "!!".red()
        };
        println!("  {} {}", mark, finding.check.name);
        if !finding.check.detail.is_empty() {
            println!("     {}", finding.check.detail.as_str().dimmed());
        }
    }
    println!();

    if all_ok {
        println!("{} All checks passed!", "SUCCESS".green().bold());
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "{} Some checks failed. See above for details.",
            "WARNING".yellow().bold()
        );
        Ok(ExitCode::from(1))
    }
}

fn collect(config: Option<&Path>) -> Vec<Finding> {
    let mut findings = Vec::new();

    let path = Manifest::locate(config);
    let manifest = match Manifest::from_path(&path) {
        Ok(manifest) => {
            findings.push(Finding::ok(
                "Manifest",
                format!("{}", path.display()),
                format!("{} variant(s)", manifest.variants.len()),
            ));
            manifest
        }
        Err(e) => {
            findings.push(Finding::fail(
                "Manifest",
                format!("{}", path.display()),
                e.to_string(),
            ));
            return findings;
        }
    };

    for variant in &manifest.variants {
        check_assets(&manifest, variant, &mut findings);
    }
    for variant in &manifest.variants {
        check_model(&manifest, variant, &mut findings);
    }
    findings
}

fn check_assets(manifest: &Manifest, variant: &VariantConfig, findings: &mut Vec<Finding>) {
    let files = variant.assets.resolved(&manifest.base_dir);
    for path in [
        files.vertices_path(),
        files.faces_path(),
        files.deform_nodes_path(),
    ] {
        let name = format!("{}: {}", variant.name, path.display());
        if path.is_file() {
            findings.push(Finding::ok("Assets", name, ""));
        } else {
            findings.push(Finding::fail("Assets", name, "file not found"));
        }
    }
}

fn check_model(manifest: &Manifest, variant: &VariantConfig, findings: &mut Vec<Finding>) {
    match variant.model.resolved(&manifest.base_dir) {
        ModelDescriptor::Linear { path } => {
            let name = format!("{}: {} (linear)", variant.name, path.display());
            if path.is_file() {
                findings.push(Finding::ok("Models", name, ""));
            } else {
                findings.push(Finding::fail("Models", name, "file not found"));
            }
        }
        ModelDescriptor::Subprocess {
            model,
            interpreter,
            runner,
            ..
        } => {
            let name = format!("{}: {} (subprocess)", variant.name, model.display());
            if model.is_file() {
                findings.push(Finding::ok("Models", name, ""));
            } else {
                findings.push(Finding::fail("Models", name, "file not found"));
            }

            if let Some(runner) = &runner {
                let name = format!("{}: runner {}", variant.name, runner.display());
                if runner.is_file() {
                    findings.push(Finding::ok("Models", name, ""));
                } else {
                    findings.push(Finding::fail("Models", name, "file not found"));
                }
            }

            check_interpreter(
                &variant.name,
                interpreter.as_deref(),
                runner.is_some(),
                findings,
            );
        }
    }
}

/// The bundled runner needs `numpy` and `onnxruntime`; a custom runner may
/// not, so a failed import probe is only a warning for it.
fn check_interpreter(
    variant: &str,
    explicit: Option<&Path>,
    custom_runner: bool,
    findings: &mut Vec<Finding>,
) {
    let interpreter = match find_interpreter(explicit) {
        Ok(path) => path,
        Err(e) => {
            findings.push(Finding::fail(
                "Runtime",
                format!("{}: interpreter", variant),
                e.to_string(),
            ));
            return;
        }
    };

    let name = format!("{}: {}", variant, interpreter.display());
    let probe = Command::new(&interpreter)
        .args(["-c", "import numpy, onnxruntime; print(onnxruntime.__version__)"])
        .output();
    match probe {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            findings.push(Finding::ok(
                "Runtime",
                name,
                format!("onnxruntime {}", version),
            ));
        }
        Ok(_) if custom_runner => findings.push(Finding::warn(
            "Runtime",
            name,
            "numpy and onnxruntime are not importable (only the bundled runner needs them)",
        )),
        Ok(_) => findings.push(Finding::fail(
            "Runtime",
            name,
            "numpy and onnxruntime must be importable (pip install numpy onnxruntime)",
        )),
        Err(e) => findings.push(Finding::fail("Runtime", name, e.to_string())),
    }
}
