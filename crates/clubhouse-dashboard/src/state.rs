//! Dashboard application state.

use chrono::{DateTime, Utc};
use clubhouse_core::DashboardConfig;
use clubhouse_runtime::Services;
use clubhouse_spreadsheet::Workbook;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared application state for the dashboard.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    services: Services,
    config: DashboardConfig,
    /// Hosted project URL, shown on the settings page.
    project_url: Option<String>,
    uploads: RwLock<UploadSessions>,
}

/// A workbook waiting for its column mapping.
#[derive(Debug)]
pub struct PendingUpload {
    pub file_name: String,
    pub workbook: Workbook,
    pub uploaded_at: DateTime<Utc>,
}

/// Uploaded workbooks by token, oldest first.
#[derive(Default)]
struct UploadSessions {
    order: VecDeque<Uuid>,
    uploads: HashMap<Uuid, Arc<PendingUpload>>,
}

impl AppState {
    pub fn new(services: Services, config: DashboardConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                services,
                config,
                project_url: None,
                uploads: RwLock::new(UploadSessions::default()),
            }),
        }
    }

    /// Create state that displays the hosted project URL.
    pub fn with_project_url(self, project_url: impl Into<String>) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(inner) => inner,
            Err(shared) => AppStateInner {
                services: shared.services.clone(),
                config: shared.config.clone(),
                project_url: None,
                uploads: RwLock::new(UploadSessions::default()),
            },
        };
        Self {
            inner: Arc::new(AppStateInner {
                project_url: Some(project_url.into()),
                ..inner
            }),
        }
    }

    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    pub fn project_url(&self) -> Option<&str> {
        self.inner.project_url.as_deref()
    }

    /// Keep an uploaded workbook until it is imported. When the session
    /// limit is reached the oldest upload is dropped.
    pub async fn store_upload(&self, file_name: String, workbook: Workbook) -> Uuid {
        let token = Uuid::new_v4();
        let limit = self.inner.config.max_pending_uploads.max(1);
        let mut sessions = self.inner.uploads.write().await;
        while sessions.order.len() >= limit {
            if let Some(oldest) = sessions.order.pop_front() {
                sessions.uploads.remove(&oldest);
                tracing::debug!(token = %oldest, "Evicted pending upload");
            }
        }
        sessions.order.push_back(token);
        sessions.uploads.insert(
            token,
            Arc::new(PendingUpload {
                file_name,
                workbook,
                uploaded_at: Utc::now(),
            }),
        );
        token
    }

    pub async fn upload(&self, token: Uuid) -> Option<Arc<PendingUpload>> {
        self.inner.uploads.read().await.uploads.get(&token).cloned()
    }

    /// Remove an upload once it has been imported.
    pub async fn finish_upload(&self, token: Uuid) {
        let mut sessions = self.inner.uploads.write().await;
        sessions.uploads.remove(&token);
        sessions.order.retain(|t| *t != token);
    }

    pub async fn pending_uploads(&self) -> usize {
        self.inner.uploads.read().await.order.len()
    }
}
