use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Serves the comparison API for one store pair.
pub struct StateDiffServer {
    config: ServerConfig,
    state: AppState,
}

impl StateDiffServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C, then close both stores.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("statediff server listening on {}", self.config.bind_addr);
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        tracing::info!("statediff server stopped");
        let closed = self.state.pair.close().map_err(ServerError::from);
        served.and(closed)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statediff_compare::StorePair;
    use statediff_store::MemoryStore;
    use std::sync::Arc;

    fn state() -> AppState {
        let pair = StorePair::new(MemoryStore::new(), MemoryStore::new());
        AppState::new(Arc::new(pair), "left", "right")
    }

    #[test]
    fn server_construction() {
        let server = StateDiffServer::new(ServerConfig::default(), state());
        assert_eq!(server.config().bind_addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = StateDiffServer::new(ServerConfig::default(), state());
        let _router = server.router();
    }
}
