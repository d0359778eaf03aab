//! `skyforge`: stitch six skybox faces into a 4x3 cross atlas.
//!
//! Configuration is loaded from `skyforge.ron` and can be overridden via CLI flags.
//! Run with `skyforge path/to/faces` to convert a folder of face images.

mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use skyforge_atlas::{StitchError, StitchReport, Stitcher};
use skyforge_config::{CliArgs, Config, default_config_dir};
use skyforge_materials::{MaterialKind, cleanup_candidates, delete_files, write_material};
use tracing::{error, info, warn};

use crate::prompt::{LinePrompter, Prompter, decide};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Load or create config, then apply CLI overrides
    let (mut config, config_warning) = load_config(args.config.clone());
    config.apply_cli_overrides(&args);

    skyforge_log::init_logging(
        args.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );
    if let Some(message) = config_warning {
        warn!("{message}");
    }

    let stdin = std::io::stdin();
    let mut prompter = LinePrompter::new(stdin.lock(), std::io::stdout());
    let succeeded = match run(&config, &args, &mut prompter) {
        Ok(()) => true,
        Err(e) if e.is_recoverable() => {
            error!("{e}");
            error!("stitching cancelled");
            false
        }
        Err(e) => {
            error!("an error occurred: {e}");
            false
        }
    };

    println!("{}", banner(succeeded));
    if config.exit_delay_secs > 0 {
        info!("exiting in {} seconds", config.exit_delay_secs);
        std::thread::sleep(Duration::from_secs(config.exit_delay_secs));
    }

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Config from `--config` or the platform directory. Failures fall back to
/// defaults with a message to log once logging is up.
fn load_config(explicit_dir: Option<PathBuf>) -> (Config, Option<String>) {
    let config_dir = match explicit_dir.map_or_else(default_config_dir, Ok) {
        Ok(dir) => dir,
        Err(e) => return (Config::default(), Some(format!("{e}, using defaults"))),
    };
    match Config::load_or_create(&config_dir) {
        Ok(config) => (config, None),
        Err(e) => (
            Config::default(),
            Some(format!("failed to load config: {e}, using defaults")),
        ),
    }
}

fn run(config: &Config, args: &CliArgs, prompter: &mut dyn Prompter) -> Result<(), StitchError> {
    let stitcher = Stitcher::new(config.stitch.clone());
    let report = stitcher.run(&config.input.directory, &config.output.atlas_path())?;
    info!(
        "{:?} atlas with {}px faces",
        report.topology.shape, report.topology.unit_size
    );

    create_materials(config, args, prompter);
    clean_sources(&report, args, prompter);
    Ok(())
}

fn create_materials(config: &Config, args: &CliArgs, prompter: &mut dyn Prompter) {
    let texture_path = config.output.engine_texture_path();
    let mut created = 0;

    for kind in MaterialKind::ALL {
        let (flag, path) = match kind {
            MaterialKind::Skybox => (args.skybox_material, config.output.skybox_material_path()),
            MaterialKind::Moondome => (
                args.moondome_material,
                config.output.moondome_material_path(),
            ),
        };
        let question = format!("Do you want to create a {} Material?", kind.label());
        if !decide(flag, args.non_interactive, prompter, &question) {
            continue;
        }
        match write_material(kind, &path, &texture_path) {
            Ok(()) => created += 1,
            Err(e) => warn!("{e}"),
        }
    }

    if created == 0 {
        info!("no materials were created");
    } else {
        info!("{created} material(s) created successfully");
    }
}

fn clean_sources(report: &StitchReport, args: &CliArgs, prompter: &mut dyn Prompter) {
    let candidates = cleanup_candidates(report.sources.values());
    if candidates.is_empty() {
        info!("no original .vtf or .vmt files to clean up");
        return;
    }

    println!("The following original files can be deleted:");
    for path in &candidates {
        println!("  - {}", path.display());
    }

    if decide(
        args.delete_sources,
        args.non_interactive,
        prompter,
        "Do you want to delete these files?",
    ) {
        let summary = delete_files(&candidates);
        if !summary.failed.is_empty() {
            warn!("{} file(s) could not be deleted", summary.failed.len());
        }
    } else {
        info!("original files kept");
    }
}

fn banner(succeeded: bool) -> String {
    let title = if succeeded {
        "PROCESS COMPLETE"
    } else {
        "PROCESS FAILED"
    };
    let rule = "=".repeat(60);
    format!("\n{rule}\n{title:^60}\n{rule}")
}
