//! Configuration types for Clubhouse.
//!
//! Configuration is read from an optional YAML file (`clubhouse.yaml`).
//! Every section has defaults, so running without a file is the common case:
//! the database connection comes from the `POSTGRES_URL` and `SUPABASE_URL`
//! environment variables.
//!
//! ```yaml
//! upstream:
//!   database_url_env: POSTGRES_URL
//!   project_url_env: SUPABASE_URL
//!   max_connections: 5
//! dashboard:
//!   host: 0.0.0.0
//!   port: 8080
//! logging:
//!   filter: info,clubhouse_dashboard=debug
//! ```

pub mod dashboard;
pub mod logging;
pub mod upstream;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use dashboard::DashboardConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use upstream::{ResolvedUpstream, UpstreamConfig};

/// Complete Clubhouse configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubConfig {
    /// Hosted database connection.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Web dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("environment variable {0} is not set")]
    MissingEnv(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClubConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Reject values that would only fail later at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upstream.database_url_env.trim().is_empty() {
            return Err(ConfigError::Config(
                "upstream.database_url_env must name an environment variable".into(),
            ));
        }
        if self.upstream.max_connections == 0 {
            return Err(ConfigError::Config(
                "upstream.max_connections must be at least 1".into(),
            ));
        }
        if self.dashboard.max_pending_uploads == 0 {
            return Err(ConfigError::Config(
                "dashboard.max_pending_uploads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = ClubConfig::load(None).unwrap();
        assert_eq!(config.upstream.database_url_env, "POSTGRES_URL");
        assert_eq!(config.upstream.project_url_env, "SUPABASE_URL");
        assert_eq!(config.dashboard.port, 8080);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = ClubConfig::from_yaml(
            r#"
dashboard:
  host: 0.0.0.0
  port: 9000
"#,
        )
        .unwrap();
        assert_eq!(config.dashboard.host, "0.0.0.0");
        assert_eq!(config.dashboard.port, 9000);
        assert_eq!(config.upstream.max_connections, 5);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "upstream:\n  database_url_env: CLUB_DB\n  max_connections: 2\nlogging:\n  filter: debug"
        )
        .unwrap();
        let config = ClubConfig::from_file(file.path()).unwrap();
        assert_eq!(config.upstream.database_url_env, "CLUB_DB");
        assert_eq!(config.upstream.max_connections, 2);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_rejects_zero_connections() {
        let err = ClubConfig::from_yaml("upstream:\n  max_connections: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ClubConfig::load(Some(Path::new("/nonexistent/clubhouse.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
