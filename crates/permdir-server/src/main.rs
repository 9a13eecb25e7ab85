//! permdir: runs one directory query against the stored directory and
//! prints the matching identifiers as a JSON array.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use permdir_core::entity::EntityKey;
use permdir_core::error::{PermdirError, PermdirResult};
use permdir_db::{DbError, DbManager, load_directory, run_migrations};
use permdir_query::{QueryEngine, QueryParams};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

const DEFAULT_LOG_FILTER: &str = "permdir=info";

/// Exit status for rejected query parameters.
const EXIT_INVALID_QUERY: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match run(&cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) if err.is_client_error() => {
            warn!(error = %err, "Rejected query");
            ExitCode::from(EXIT_INVALID_QUERY)
        }
        Err(err) => {
            error!(error = %err, "Query failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> PermdirResult<String> {
    let pairs = cli.params.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let params = QueryParams::from_pairs(pairs)?;
    let engine = QueryEngine::new(cli.locale_config())?;

    // Reject bad parameters before touching the database.
    let query = engine.compile(cli.entity, &params, cli.locale.as_deref())?;

    let manager = DbManager::connect(&cli.db_config())
        .await
        .map_err(DbError::from)?;
    if cli.migrate {
        run_migrations(manager.client()).await?;
    }
    let directory = load_directory(manager.client()).await?;

    let keys: Vec<EntityKey> = query
        .run(&directory)
        .into_iter()
        .map(|entity| entity.key())
        .collect();
    info!(entity = %cli.entity, matched = keys.len(), "Query complete");

    serde_json::to_string(&keys).map_err(|e| PermdirError::Internal(e.to_string()))
}
