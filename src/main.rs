//! Обучение базовой модели цены из сырого CSV с объявлениями
//!
//! Использование:
//! ```
//! cargo run -- listings.csv --data-dir data --model-file baseline.json
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use house_price_ml::{pipeline, PipelineConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train a baseline linear house price model")]
struct Args {
    /// Raw listings CSV (looked up in <data-dir>/raw)
    raw_file: String,

    /// Name of the processed CSV written to <data-dir>/processed
    #[arg(long, default_value = "listings_processed.csv")]
    processed_file: String,

    /// Name of the model file written to <data-dir>/models
    #[arg(long, default_value = "baseline_linear.json")]
    model_file: String,

    /// JSON config; missing fields take defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides data_dir from the config
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }

    tracing::info!("Starting training on {}", args.raw_file);
    let report = pipeline::run(&config, &args.raw_file, &args.processed_file, &args.model_file)
        .context("Pipeline failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
