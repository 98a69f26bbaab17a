use std::sync::Arc;

use folio_sdk::Folio;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Folio HTTP server.
pub struct FolioServer {
    config: ServerConfig,
    folio: Arc<Folio>,
}

impl FolioServer {
    /// A server over a fresh in-memory Folio instance.
    pub fn new(config: ServerConfig) -> Self {
        let folio = Folio::in_memory().with_pagination(config.pagination);
        Self::with_folio(config, Arc::new(folio))
    }

    /// A server over an existing Folio instance. The instance's own
    /// pagination rules apply.
    pub fn with_folio(config: ServerConfig, folio: Arc<Folio>) -> Self {
        Self { config, folio }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn folio(&self) -> &Arc<Folio> {
        &self.folio
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.folio.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("Folio server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
