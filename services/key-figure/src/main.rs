//! Key figure generator.
//!
//! Runs the wind streamplot pipeline once and exits.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use key_figure::{KeyFigureConfig, KeyFigurePipeline};

#[derive(Parser, Debug)]
#[command(name = "key-figure")]
#[command(about = "Render the wind streamplot key figure")]
struct Args {
    /// Configuration file path (YAML); defaults reproduce the key figure
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting key figure generation");

    let config = KeyFigureConfig::load(args.config.as_deref())?;
    info!(
        dataset = %config.input.dataset.display(),
        outputs = config.outputs.len(),
        "Loaded configuration"
    );

    let pipeline = KeyFigurePipeline::new(config).context("Invalid configuration")?;
    let summary = pipeline.run()?;

    for output in &summary.outputs {
        info!(
            path = %output.path.display(),
            bytes = output.bytes,
            "Wrote output"
        );
    }
    info!(
        time = ?summary.timestamp,
        streamlines = summary.streamline_count,
        "Done"
    );

    Ok(())
}
