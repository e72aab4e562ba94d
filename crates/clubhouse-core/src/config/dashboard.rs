//! Dashboard configuration.
//!
//! This module defines configuration for the web UI.

use serde::{Deserialize, Serialize};

/// Configuration for the web dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Host to bind the dashboard to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted workbook upload, in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Uploaded workbooks kept in memory while waiting for a mapping.
    #[serde(default = "default_max_pending_uploads")]
    pub max_pending_uploads: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            max_pending_uploads: default_max_pending_uploads(),
        }
    }
}

impl DashboardConfig {
    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_max_pending_uploads() -> usize {
    16
}
