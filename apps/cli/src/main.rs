//! Mini ML Platform training job
//!
//! Trains a classifier from a CSV dataset and publishes `model.bin` and
//! `schema.json` under `<model-id>/` in the configured bucket.

mod config;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use mlp_training::{
    ArtifactKind, ArtifactPublisher, JobInputs, ObjectStore, PipelineReport, PublishConfig, RandomForestTrainer,
    S3ObjectStore, TrainingError, TrainingPipeline,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Train a classifier and publish it with its schema
#[derive(Parser, Debug)]
#[command(
    name = "train-model",
    author,
    version,
    about = "Train a classifier from a CSV file and publish model.bin + schema.json",
    long_about = "Reads a labeled CSV dataset and a schema declaring the label column and its ordered classes,\ntrains a random forest, and uploads <model-id>/model.bin and <model-id>/schema.json to the object store.\n\nObject store settings come from BUCKET_NAME, MINIO_ENDPOINT, MINIO_ACCESS_KEY, MINIO_SECRET_KEY,\nMINIO_REGION and ORPHAN_POLICY (rollback|leave)."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Path to the training CSV (header row required)
    dataset: Option<PathBuf>,

    /// Path to the schema JSON
    schema: Option<PathBuf>,

    /// Model identifier used as the object key prefix
    model_id: Option<String>,
}

impl Args {
    fn job_inputs(&self) -> Option<JobInputs> {
        Some(JobInputs {
            dataset_path: self.dataset.clone()?,
            schema_path: self.schema.clone()?,
            model_id: self.model_id.clone()?,
        })
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn print_summary(report: &PipelineReport) {
    println!();
    println!("{}", "Training and upload completed".bold().green());
    println!("  Model:  {}", report.model_id.cyan());
    println!("  Bucket: {}", report.receipt.bucket.cyan());
    println!("  Rows:   {}", report.rows);
    for kind in [ArtifactKind::Model, ArtifactKind::Schema] {
        if let Some(artifact) = report.receipt.artifact(kind) {
            println!("  {} {}", artifact.key, artifact.sha256.dimmed());
        }
    }
    println!();
}

fn run(inputs: &JobInputs) -> Result<PipelineReport> {
    let config = config::load_publish_config()?;
    info!("Object store: {} bucket={} orphan_policy={}", config.endpoint, config.bucket, config.orphan_policy);

    let store = S3ObjectStore::connect(&config).context("Failed to set up object store client")?;
    execute(inputs, &config, &store)
}

fn execute(inputs: &JobInputs, config: &PublishConfig, store: &dyn ObjectStore) -> Result<PipelineReport> {
    let publisher = ArtifactPublisher::new(store, config.bucket.clone(), config.orphan_policy);
    let trainer = RandomForestTrainer::default();

    let report = TrainingPipeline::new(&trainer, publisher).run(inputs)?;
    Ok(report)
}

/// Report the outcome and map it to the process exit status.
fn exit_status(result: Result<PipelineReport>) -> u8 {
    match result {
        Ok(report) => {
            print_summary(&report);
            0
        }
        Err(e) => {
            error!("{e:#}");
            1
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let Some(inputs) = args.job_inputs() else {
        let err = TrainingError::ConfigurationMissing("expected <DATASET> <SCHEMA> <MODEL_ID>".to_string());
        info!("{}", Args::command().render_usage());
        error!("{err}");
        return ExitCode::FAILURE;
    };

    ExitCode::from(exit_status(run(&inputs)))
}
