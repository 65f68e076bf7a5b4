use std::future::Future;
use std::net::SocketAddr;
use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::AppConfig;
use crate::error::{EwclError, Result};

/// HTTP server for the collapse-score API
pub struct ApiServer {
    state: AppState,
    config: AppConfig,
}

impl ApiServer {
    pub fn new(state: AppState, config: AppConfig) -> Self {
        Self { state, config }
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| {
                EwclError::InvalidConfig(format!(
                    "invalid listen address {}:{}: {e}",
                    self.config.server.host, self.config.server.port
                ))
            })
    }

    /// Serve until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.addr()?;
        let app = create_router(self.state, &self.config.cors, &self.config.upload);

        info!("Starting EWCL API on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| EwclError::Internal(format!("API server error: {}", e)))?;

        info!("EWCL API stopped");
        Ok(())
    }
}
