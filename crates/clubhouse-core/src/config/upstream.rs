//! Hosted database connection settings.
//!
//! The connection string never lives in the YAML file. The file only names
//! the environment variables that carry it, so the same config works for
//! local development and for the hosted deployment.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration for the upstream Postgres connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Environment variable containing the PostgreSQL connection URL.
    #[serde(default = "default_database_url_env")]
    pub database_url_env: String,

    /// Environment variable containing the hosted project URL.
    #[serde(default = "default_project_url_env")]
    pub project_url_env: String,

    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Timeout in seconds when acquiring a connection.
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            database_url_env: default_database_url_env(),
            project_url_env: default_project_url_env(),
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }
}

/// Connection values read from the environment.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedUpstream {
    pub database_url: String,
    pub project_url: String,
}

impl std::fmt::Debug for ResolvedUpstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedUpstream")
            .field("database_url", &redact_url(&self.database_url))
            .field("project_url", &self.project_url)
            .finish()
    }
}

impl UpstreamConfig {
    /// Read both variables from the process environment.
    pub fn resolve(&self) -> Result<ResolvedUpstream, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Read both variables through `lookup`. Missing or blank values are
    /// errors.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<ResolvedUpstream, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };
        Ok(ResolvedUpstream {
            database_url: read(&self.database_url_env)?,
            project_url: read(&self.project_url_env)?,
        })
    }
}

/// Hide the password part of a connection URL for logs.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => {
            let user = credentials.split(':').next().unwrap_or_default();
            format!("{}://{}:***@{}", scheme, user, host)
        }
        None => url.to_string(),
    }
}

fn default_database_url_env() -> String {
    "POSTGRES_URL".to_string()
}

fn default_project_url_env() -> String {
    "SUPABASE_URL".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    10
}
