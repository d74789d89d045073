use crate::{commands::Commands, error::CliError};
use clap::Parser;
use engine_config::{options, validator::JobValidator};
use engine_runtime::{
    engine::TokioPartitionEngine,
    error::PipelineError,
    execution::{
        executor::{self, PipelineDeps},
        replicate::ReplicationBindings,
        shard::JsonShardEncoder,
        stats,
    },
};
use model::staging::COMMITTED_SUFFIX;
use std::sync::Arc;
use store::{
    copier::ThrottledCopier,
    fs::{LocalStagingStore, walk_files},
    local::LocalStoreClient,
    session::PropertySessionFactory,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod error;
mod output;
mod shutdown;

#[derive(Parser)]
#[command(name = "shardlift", version = "0.1.0", about = "Staged bulk-ingest pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    // Initialize logger
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            job_id,
            store_root,
            dest_store_root,
        } => {
            run_job(config, input, job_id, store_root, dest_store_root).await?;
        }
        Commands::Validate { config, output } => {
            let options = config::load_options(&config).await?;
            let job_id = uuid::Uuid::new_v4().to_string();
            let spec = JobValidator::new(&job_id, &options).validate()?;

            match output {
                Some(path) => output::write_json(&spec, path).await?,
                None => output::print_json(&spec)?,
            }
        }
        Commands::Inspect { staging } => {
            inspect_staging(&staging).await?;
        }
    }

    Ok(())
}

async fn run_job(
    config: String,
    input: Option<String>,
    job_id: Option<String>,
    store_root: String,
    dest_store_root: Option<String>,
) -> Result<(), CliError> {
    let options = config::load_options(&config).await?;
    let job_id = job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let rows = match &input {
        Some(path) => config::load_rows(path).await?,
        None => Vec::new(),
    };
    info!(job_id, rows = rows.len(), "input dataset loaded");

    let cancel = CancellationToken::new();
    shutdown::listen_for_shutdown(cancel.clone());

    let wants_replication = options
        .get(options::DO_REPLICATE)
        .is_some_and(|v| v == "true");
    let replication = wants_replication.then(|| {
        let dest_root = dest_store_root.unwrap_or_else(|| store_root.clone());
        ReplicationBindings {
            client: Arc::new(LocalStoreClient::new(dest_root)),
            fs: Arc::new(LocalStagingStore),
            copier: Arc::new(ThrottledCopier),
        }
    });
    let deps = PipelineDeps {
        sessions: Arc::new(PropertySessionFactory),
        source_client: Arc::new(LocalStoreClient::new(store_root)),
        source_fs: Arc::new(LocalStagingStore),
        engine: Arc::new(TokioPartitionEngine),
        encoder: Arc::new(JsonShardEncoder),
        replication,
    };

    match executor::validate_and_run(&job_id, &options, rows, deps, cancel.clone()).await {
        Ok(report) => {
            output::print_json(&report)?;
            Ok(())
        }
        Err(err) => {
            if cancel.is_cancelled() && matches!(err.source, PipelineError::Cancelled) {
                info!(job_id = err.job_id, "job stopped by shutdown signal");
                std::process::exit(shutdown::SHUTDOWN_EXIT_CODE);
            }
            Err(err.into())
        }
    }
}

/// Walks `<base>/<date>/<job_id>_succ` trees and prints a size summary for
/// each.
async fn inspect_staging(base: &str) -> Result<(), CliError> {
    let mut committed = Vec::new();
    let mut dates = tokio::fs::read_dir(base).await?;
    while let Some(date) = dates.next_entry().await? {
        if !date.file_type().await?.is_dir() {
            continue;
        }
        let mut jobs = tokio::fs::read_dir(date.path()).await?;
        while let Some(job) = jobs.next_entry().await? {
            let name = job.file_name().to_string_lossy().into_owned();
            if job.file_type().await?.is_dir() && name.ends_with(COMMITTED_SUFFIX) {
                committed.push(job.path());
            }
        }
    }
    committed.sort();

    if committed.is_empty() {
        println!("No committed staging trees under '{base}'");
        return Ok(());
    }

    println!("{:<60} {:>8} {:>12}", "Committed tree", "Files", "Size");
    for path in committed {
        let files = walk_files(&path).await?;
        let total: u64 = files.iter().map(|f| f.len).sum();
        println!(
            "{:<60} {:>8} {:>12}",
            path.display(),
            files.len(),
            stats::human_bytes(total)
        );
    }
    Ok(())
}
