//! Web server for shelf.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::file::FileManager;
use crate::{Result, ShelfError};

use super::handlers::AppState;
use super::router::{create_health_router, create_router};

/// Web server for the connector API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Multipart body limit in bytes.
    max_upload_size: usize,
}

impl WebServer {
    /// Create a new web server from the configuration.
    ///
    /// Initializes the confined file root, creating it if missing.
    pub fn new(config: &Config) -> Result<Self> {
        let addr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| ShelfError::Config(format!("invalid server address: {e}")))?;

        let fm = FileManager::new(&config.storage)?;
        tracing::info!("File root initialized at: {}", fm.root().display());

        Ok(Self {
            addr,
            app_state: Arc::new(AppState::new(fm)),
            max_upload_size: config.storage.max_upload_size() as usize,
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(&self) -> Router {
        create_router(self.app_state.clone(), self.max_upload_size)
            .merge(create_health_router())
    }

    /// Run the web server.
    pub async fn run(self) -> std::io::Result<()> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        axum::serve(listener, router).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();

        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("Web server listening on http://{}", local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}
