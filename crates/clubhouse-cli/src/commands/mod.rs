//! Subcommand implementations for the `clubhouse` binary.

pub mod check;
pub mod export;
pub mod import;
pub mod init_db;
pub mod serve;

use anyhow::{Context, Result};
use clubhouse_adapter_pg::PostgresStore;
use clubhouse_core::ClubConfig;
use clubhouse_core::config::ResolvedUpstream;
use clubhouse_core::config::upstream::redact_url;
use std::sync::Arc;

/// Resolve the connection variables and open the pool.
pub async fn connect(config: &ClubConfig) -> Result<(Arc<PostgresStore>, ResolvedUpstream)> {
    let upstream = config
        .upstream
        .resolve()
        .context("Database connection is not configured")?;
    tracing::info!(
        database = %redact_url(&upstream.database_url),
        "Connecting to the membership database"
    );
    let store = PostgresStore::connect(&upstream.database_url, (&config.upstream).into())
        .await
        .context("Failed to connect to the membership database")?;
    Ok((Arc::new(store), upstream))
}
