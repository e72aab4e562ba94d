//! `clubhouse check-config` - validate configuration and environment.

use anyhow::{Context, Result};
use clubhouse_core::ClubConfig;
use clubhouse_core::config::upstream::redact_url;
use clubhouse_runtime::ClubStore;
use std::path::Path;

/// Lines describing the effective configuration.
pub fn summary(config: &ClubConfig, source: Option<&Path>) -> Vec<String> {
    vec![
        format!(
            "config:      {}",
            source.map_or("(defaults)".to_string(), |p| p.display().to_string())
        ),
        format!(
            "database:    ${} (max {} connections, {}s acquire timeout)",
            config.upstream.database_url_env,
            config.upstream.max_connections,
            config.upstream.acquire_timeout_seconds
        ),
        format!("project url: ${}", config.upstream.project_url_env),
        format!(
            "dashboard:   http://{} (uploads up to {} KiB, {} pending)",
            config.dashboard.bind_address(),
            config.dashboard.max_upload_bytes / 1024,
            config.dashboard.max_pending_uploads
        ),
        format!(
            "logging:     {} ({:?})",
            config.logging.filter, config.logging.format
        ),
    ]
}

pub async fn run(config: &ClubConfig, source: Option<&Path>, connect: bool) -> Result<()> {
    for line in summary(config, source) {
        println!("{}", line);
    }

    let upstream = config
        .upstream
        .resolve()
        .context("Database connection is not configured")?;
    println!("resolved:    {}", redact_url(&upstream.database_url));
    println!("             {}", upstream.project_url);

    if connect {
        let (store, _) = super::connect(config).await?;
        let ping = store.ping().await;
        store.close().await;
        ping.context("Database ping failed")?;
        println!("database:    reachable");
    }

    println!("Configuration OK.");
    Ok(())
}
