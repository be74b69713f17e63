//! # Datama Snapshot
//!
//! Runs the startup sequence once from the command line.
//!
//! ## Usage
//! ```bash
//! # Credentials from the environment
//! SUPABASE_URL=https://xyz.supabase.co SUPABASE_KEY=... datama-snapshot
//!
//! # Explicit config file
//! datama-snapshot --config ./datama.toml
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show request-level messages
//! - `RUST_LOG=datama_client=trace,datama_sync=trace` - Trace datama crates only
//! - Default: INFO level

use std::env;
use std::path::PathBuf;

use anyhow::Context;
use datama_client::ClientConfig;
use datama_core::Table;
use datama_sync::AppState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::load(config_path_arg()).context("Failed to load configuration")?;
    info!(
        url = %config.backend.url,
        schema = %config.backend.schema,
        "Configuration loaded"
    );

    let state = AppState::initialize(config).context("Failed to initialize application state")?;
    match state.current_user() {
        Some(user) => info!(user = %user.display_name(), id = %user.id, "Signed in"),
        None => info!("No signed-in user"),
    }

    let report = state.fetch_all().await;

    for table in Table::ALL {
        let collection = state.store().collection(table);
        match report.rows_loaded(table) {
            Some(rows) => info!(collection = table.collection_name(), rows, "Loaded"),
            None => warn!(
                collection = table.collection_name(),
                kept = collection.len(),
                "Not loaded"
            ),
        }
    }

    for (table, err) in report.failures() {
        error!(%table, error = %err, "Fetch failed");
    }

    info!(
        rows = report.total_rows(),
        elapsed_ms = report.elapsed().as_millis() as u64,
        "Snapshot finished"
    );

    let result = report.into_result();
    state.shutdown();
    result?;
    Ok(())
}

/// Reads `--config <path>` from the command line.
fn config_path_arg() -> Option<PathBuf> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
