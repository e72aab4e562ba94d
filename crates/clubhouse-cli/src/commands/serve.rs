//! `clubhouse serve` - start the web dashboard.

use anyhow::{Context, Result};
use clubhouse_core::ClubConfig;
use clubhouse_dashboard::{AppState, DashboardServer, shutdown_signal};
use clubhouse_runtime::Services;

pub async fn run(config: ClubConfig) -> Result<()> {
    let (store, upstream) = super::connect(&config).await?;
    store
        .bootstrap()
        .await
        .context("Failed to prepare the database schema")?;

    let services = Services::new(store.clone());
    match services.settings.club_name().await? {
        Some(name) => tracing::info!(club = %name, "Loaded club settings"),
        None => tracing::info!("Club is not named yet, the dashboard will ask for a name"),
    }

    let state = AppState::new(services, config.dashboard.clone())
        .with_project_url(upstream.project_url);
    let result = DashboardServer::new(state).run(shutdown_signal()).await;

    store.close().await;
    result.context("Dashboard stopped with an error")
}
