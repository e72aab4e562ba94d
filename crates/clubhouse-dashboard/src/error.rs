//! Error types for the dashboard crate.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use clubhouse_core::ClubError;
use thiserror::Error;

use crate::templates;

/// Errors that can occur in the dashboard.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// Failed to start the server.
    #[error("failed to start dashboard: {0}")]
    StartupFailed(String),

    /// The record was deleted or never existed.
    #[error("{0} not found, please refresh")]
    NotFound(String),

    /// Invalid request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The database cannot be reached.
    #[error("the database is unreachable: {0}")]
    Unavailable(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ClubError> for DashboardError {
    fn from(e: ClubError) -> Self {
        match e {
            ClubError::Connection(msg) => DashboardError::Unavailable(msg),
            ClubError::NotFound { entity, id } => {
                DashboardError::NotFound(format!("{} {}", entity, id))
            }
            ClubError::Validation { .. } | ClubError::Constraint(_) => {
                DashboardError::InvalidRequest(e.to_string())
            }
            ClubError::Spreadsheet(_) => DashboardError::InvalidRequest(e.to_string()),
            ClubError::Database(msg) => DashboardError::Internal(msg),
        }
    }
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::NotFound(_) => StatusCode::NOT_FOUND,
            DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let (title, icon) = match &self {
            DashboardError::NotFound(_) => ("Not found", "search"),
            DashboardError::Unavailable(_) => ("Database unavailable", "plug-circle-xmark"),
            DashboardError::InvalidRequest(_) => ("Invalid request", "circle-exclamation"),
            _ => ("Something went wrong", "triangle-exclamation"),
        };
        let message = match &self {
            DashboardError::Unavailable(_) => {
                "The membership database cannot be reached right now. Check the connection and try again.".to_string()
            }
            other => other.to_string(),
        };
        (status, Html(templates::error_page(title, icon, &message))).into_response()
    }
}
