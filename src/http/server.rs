// HTTP server
// Binds the configured address and serves the database routes until Ctrl-C

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::routes::{database_routes, DatabaseState};
use crate::config::ServerConfig;
use crate::gate::QueryGate;
use crate::query::QueryRunner;

/// HTTP server for the vocabulary store
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server serving `gate`
    pub fn new<R: QueryRunner + 'static>(config: ServerConfig, gate: Arc<QueryGate<R>>) -> Self {
        let state = Arc::new(DatabaseState::new(gate, config.format_tables.clone()));
        let router = database_routes(state).layer(TraceLayer::new_for_http());
        Self { config, router }
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server and run until Ctrl-C
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .with_context(|| format!("Invalid socket address {}", self.config.socket_addr()))?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!(%addr, "HTTP server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("HTTP server failed")?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(%e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
