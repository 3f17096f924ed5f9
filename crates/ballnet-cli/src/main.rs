//! BallNet CLI - force and deformation prediction for a soft robotic ball
//!
//! This binary turns a six-component motion command into the predicted
//! contact force and a deformed, colored surface mesh written as GLB.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use ballnet_cli::commands;
use ballnet_cli::commands::predict::MotionArgs;

/// BallNet - force and deformation prediction
#[derive(Parser)]
#[command(name = "ballnet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Manifest path (default: $BALLNET_CONFIG, then ./ballnet.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict force and deformation for one motion command
    Predict {
        #[command(flatten)]
        motion: MotionArgs,

        /// Variant to use (default: first variant that loaded)
        #[arg(long)]
        variant: Option<String>,

        /// Output GLB path (default: a file in the temp directory)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Include vertex normals in the GLB
        #[arg(long)]
        normals: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Load every variant in the manifest and report its status
    Inspect {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Check manifest, asset files and model runtimes
    Doctor {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Predict {
            motion,
            variant,
            out,
            normals,
            json,
        } => commands::predict::run(
            config,
            &motion,
            variant.as_deref(),
            out.as_deref(),
            normals,
            json,
        ),
        Commands::Inspect { json } => commands::inspect::run(config, json),
        Commands::Doctor { json } => commands::doctor::run(config, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
