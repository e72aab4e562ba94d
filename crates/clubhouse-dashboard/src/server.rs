//! Dashboard server implementation.

use crate::error::DashboardError;
use crate::routes;
use crate::state::AppState;
use std::future::Future;
use tokio::net::TcpListener;

/// The dashboard server.
pub struct DashboardServer {
    state: AppState,
}

impl DashboardServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Serve until `shutdown` resolves, then finish in-flight requests.
    pub async fn run<F>(self, shutdown: F) -> Result<(), DashboardError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.state.config().bind_address();
        let app = routes::create_router(self.state);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| DashboardError::StartupFailed(format!("{}: {}", addr, e)))?;
        tracing::info!(address = %addr, "Clubhouse dashboard listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| DashboardError::StartupFailed(e.to_string()))?;

        tracing::info!("Dashboard stopped");
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        self.state.config().bind_address()
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_core::DashboardConfig;
    use clubhouse_runtime::{InMemoryStore, Services};
    use std::sync::Arc;

    #[test]
    fn test_server_uses_configured_address() {
        let config = DashboardConfig {
            host: "0.0.0.0".to_string(),
            port: 9090,
            ..DashboardConfig::default()
        };
        let state = AppState::new(Services::new(Arc::new(InMemoryStore::new())), config);
        let server = DashboardServer::new(state);
        assert_eq!(server.bind_address(), "0.0.0.0:9090");
    }

    #[tokio::test]
    async fn test_port_in_use_is_reported() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = DashboardConfig {
            port: taken.local_addr().unwrap().port(),
            ..DashboardConfig::default()
        };
        let state = AppState::new(Services::new(Arc::new(InMemoryStore::new())), config);
        let err = DashboardServer::new(state)
            .run(std::future::ready(()))
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::StartupFailed(_)));
    }
}
