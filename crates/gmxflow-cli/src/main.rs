mod cli;
mod config;
mod error;
mod logging;
mod progress;

use crate::cli::Cli;
use crate::config::SettingsFile;
use crate::error::Result;
use crate::progress::PipelineProgressHandler;
use clap::Parser;
use gmxflow::engine::progress::ProgressReporter;
use gmxflow::workflows::simulate;
use tracing::{debug, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_app() -> Result<()> {
    // Clap exits with code 2 on usage errors by default; the pipeline
    // contract is exit code 1 for any invalid invocation.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    std::process::exit(0)
                }
                _ => std::process::exit(1),
            }
        }
    };
    logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("🚀 gmxflow v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let settings = match &cli.config {
        Some(path) => SettingsFile::from_file(path)?,
        None => SettingsFile::default(),
    };
    let config = config::build_config(&cli, &settings)?;

    println!(
        "Starting MD pipeline: {} for {} ({} production steps)...",
        config.input.display(),
        config.time,
        config.time.production_steps()
    );

    let progress_handler = PipelineProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let report = tokio::task::block_in_place(|| simulate::run(&config, &reporter))?;

    info!(
        stages = report.stages_run,
        steps = report.production_steps,
        "Pipeline finished"
    );
    println!(
        "✅ Pipeline complete: {} ns of production dynamics across {} stages.",
        report.nanoseconds, report.stages_run
    );
    println!("   Final structure: {}", report.final_structure.display());

    Ok(())
}
