//! Command-line argument parsing for Skyforge.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Skyforge command-line arguments.
///
/// CLI values override settings loaded from `skyforge.ron`.
#[derive(Parser, Debug, Default)]
#[command(
    name = "skyforge",
    about = "Stitch six skybox face images into a single cross-layout atlas"
)]
pub struct CliArgs {
    /// Directory containing the face images.
    pub input: Option<PathBuf>,

    /// Output directory for the atlas and materials.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Atlas file name.
    #[arg(long)]
    pub atlas_file: Option<String>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Seconds to wait before exiting.
    #[arg(long)]
    pub exit_delay: Option<u64>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for JSON log files (debug builds only).
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Create the skybox material without asking.
    #[arg(long)]
    pub skybox_material: Option<bool>,

    /// Create the moondome material without asking.
    #[arg(long)]
    pub moondome_material: Option<bool>,

    /// Delete the source VTF/VMT files without asking.
    #[arg(long)]
    pub delete_sources: Option<bool>,

    /// Answer "no" to every question that has no explicit flag.
    #[arg(long)]
    pub non_interactive: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref input) = args.input {
            self.input.directory = input.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.output.directory = dir.clone();
        }
        if let Some(ref file) = args.atlas_file {
            self.output.atlas_file = file.clone();
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(delay) = args.exit_delay {
            self.exit_delay_secs = delay;
        }
    }
}
