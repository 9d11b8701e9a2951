//! Storefront HTTP server.

use crate::domain::{ApiConfig, ServerError};
use crate::routes::{build_router, AppState};
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

pub struct StorefrontServer {
    config: ApiConfig,
    router: Router,
}

impl StorefrontServer {
    pub fn new(config: ApiConfig, state: AppState) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let router = build_router(state, &config);
        Ok(Self { config, router })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr = self.config.bind_addr();
        TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))
    }

    /// Serve until `shutdown` flips to `true`.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), ServerError> {
        let addr: SocketAddr = listener
            .local_addr()
            .map_err(|e| ServerError::Bind(e.to_string()))?;
        info!(addr = %addr, "Starting storefront HTTP server");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                // A dropped sender also stops the server.
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await
            .map_err(|e| ServerError::Serve(e.to_string()))?;

        info!("Storefront HTTP server stopped");
        Ok(())
    }
}
