//! Console front end for the slicer control layer.
//!
//! Wires console implementations of the progress, issue, and path
//! capabilities into a scene controller and drives the full pipeline
//! against a synthetic print, so the control layer can be exercised
//! without the geometry backend or a GUI.

mod indicator;
mod paths;
mod sink;
mod synthetic;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use slicer_control::config::ConfigManager;
use slicer_control::controller::SceneController;
use slicer_control::logging::LogLevel;
use slicer_control::progress::IndicatorFactory;

use indicator::ConsoleIndicatorFactory;
use paths::PresetPathQuery;
use sink::ConsoleSink;
use synthetic::SyntheticPrint;

#[derive(Parser)]
#[command(name = "slicer-console", about = "Console harness for the slicer control layer")]
struct Cli {
    /// Config file path.
    #[arg(long, default_value = ".config/slicer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the print-preparation pipeline against a synthetic print.
    DryRun {
        /// Number of synthetic objects.
        #[arg(long, default_value_t = 2)]
        objects: usize,

        /// Number of synthetic layers.
        #[arg(long, default_value_t = 8)]
        layers: usize,

        /// Inject a perimeter failure for this object index.
        #[arg(long)]
        fail_object: Option<usize>,
    },

    /// Slice a synthetic print and export zipped layer images into DIR.
    Export {
        /// Number of synthetic objects.
        #[arg(long, default_value_t = 2)]
        objects: usize,

        /// Number of synthetic layers.
        #[arg(long, default_value_t = 8)]
        layers: usize,

        /// Destination directory for the archive.
        dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    slicer_control::logging::init_tracing(LogLevel::Info);

    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config
        .load_or_create()
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    config.ensure_dirs_exist()?;
    tracing::info!(config = %cli.config.display(), "configuration loaded");

    let scene = SceneController::builder()
        .settings(config.settings().clone())
        .indicator_factory(Arc::new(ConsoleIndicatorFactory))
        .issue_sink(Arc::new(ConsoleSink::new(std::io::stdin().is_terminal())))
        .path_query(Arc::new(PresetPathQuery::default()))
        .build();

    // The status-bar analog: one aggregate indicator mirroring whatever
    // the main thread reports.
    scene.set_global_progress_indicator(ConsoleIndicatorFactory.create(100, "Job", ""));

    match cli.command {
        Command::DryRun {
            objects,
            layers,
            fail_object,
        } => {
            let mut print = SyntheticPrint::new("dry_run", objects, layers);
            if let Some(index) = fail_object {
                print = print.fail_perimeters_for(index);
            }
            let print = Arc::new(print);

            let job = scene
                .set_print(print.clone())
                .context("creating print controller")?;
            let summary = job.slice().context("slicing failed")?;

            println!("Completed stages: {}", summary.stages_completed.join(", "));
            println!("Backend operations: {}", print.ops().len());
            if !summary.all_clean() {
                for err in &summary.object_errors {
                    println!("Object '{}' failed {}: {}", err.object, err.stage, err.message);
                }
            }
        }

        Command::Export {
            objects,
            layers,
            dir,
        } => {
            let print = SyntheticPrint::new("export_run", objects, layers);
            let job = scene
                .set_print(Arc::new(print))
                .context("creating print controller")?;

            let archive = job
                .slice_to_png_dir(&dir)
                .context("exporting layers failed")?;
            println!("Wrote {}", archive.display());
        }
    }

    Ok(())
}
