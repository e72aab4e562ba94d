//! `clubhouse init-db` - create missing tables.

use anyhow::{Context, Result};
use clubhouse_core::ClubConfig;

pub async fn run(config: ClubConfig) -> Result<()> {
    let (store, _) = super::connect(&config).await?;
    let result = store
        .bootstrap()
        .await
        .context("Failed to create the database schema");
    store.close().await;
    result?;

    println!("Database schema is ready.");
    Ok(())
}
