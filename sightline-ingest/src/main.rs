//! sightline-ingest - submission ingestion and asset reconciliation CLI
//!
//! Thin command-line caller around the submission store and the
//! reconciliation engine. Service deployments invoke the same library
//! entry points in-process.

use anyhow::Result;
use clap::{Parser, Subcommand};
use sightline_common::config::IngestConfig;
use sightline_ingest::{Reconciler, SubmissionStore};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "sightline-ingest",
    about = "Submission ingestion and asset reconciliation",
    version
)]
struct Cli {
    /// Storage root containing submission working trees
    #[arg(long)]
    storage_root: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an empty submission
    Create {
        #[arg(long)]
        description: Option<String>,
    },
    /// Copy a local directory into a submission and reconcile it
    Import {
        submission: Uuid,
        source: PathBuf,
    },
    /// Re-run reconciliation for a submission
    Reconcile { submission: Uuid },
    /// List known submissions
    List,
    /// Delete a submission, its assets, and its working directory
    Delete { submission: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = IngestConfig::resolve(cli.storage_root.as_deref(), cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_filter)),
        )
        .init();

    info!("Starting sightline-ingest");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Storage root: {}", config.storage_root.display());
    info!("Database: {}", config.database_path.display());

    let pool = sightline_common::db::init_database(&config.database_path).await?;
    let store = SubmissionStore::new(pool.clone(), &config);
    let reconciler = Reconciler::new(pool, &config);

    match cli.command {
        Command::Create { description } => {
            let submission = store.create(description).await?;
            println!("{}", submission.guid);
        }
        Command::Import { submission, source } => {
            let submission = store.load(submission).await?;
            store.import_local(&submission, &source).await?;
            let report = reconciler.reconcile(&submission).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Reconcile { submission } => {
            let submission = store.load(submission).await?;
            let report = reconciler.reconcile(&submission).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::List => {
            for submission in store.list().await? {
                println!(
                    "{}  {}",
                    submission.guid,
                    submission.description.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Delete { submission } => {
            let submission = store.load(submission).await?;
            store.delete(&submission).await?;
        }
    }

    Ok(())
}
