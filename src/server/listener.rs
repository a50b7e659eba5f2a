//! Relay server listener
//!
//! Binds the TCP listener and serves the router until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::hub::Hub;
use crate::server::config::ServerConfig;
use crate::server::routes::{router, AppState};
use crate::transport::websocket::WsSink;

/// Telemetry relay server
pub struct RelayServer {
    config: ServerConfig,
    hub: Arc<Hub<WsSink>>,
}

impl RelayServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        match &config.credentials {
            Some(credentials) if credentials.is_default() => {
                tracing::warn!("Using default credentials; set MOJO_AUTH_USER and MOJO_AUTH_PASS");
            }
            None => tracing::warn!("Authentication disabled on producer endpoints"),
            Some(_) => {}
        }

        Ok(Self {
            hub: Arc::new(Hub::with_config(config.hub.clone())),
            config,
        })
    }

    /// Get a reference to the hub
    pub fn hub(&self) -> &Arc<Hub<WsSink>> {
        &self.hub
    }

    /// Configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Build the router serving this server's hub
    pub fn router(&self) -> Router {
        let state = AppState {
            hub: Arc::clone(&self.hub),
            max_message_size: self.config.max_message_size,
        };
        router(state, self.config.credentials.clone())
    }

    /// Run the server
    ///
    /// This method blocks until the server fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// On shutdown every subscriber is disconnected before in-flight HTTP
    /// requests are drained.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            addr = %addr,
            history_capacity = self.config.hub.history_capacity,
            auth = self.config.credentials.is_some(),
            "Telemetry relay listening"
        );

        let hub = Arc::clone(&self.hub);
        let signal = async move {
            shutdown.await;
            tracing::info!("Shutdown signal received");

            let closed = hub.close_all().await;
            tracing::info!(subscribers = closed, "Subscribers disconnected");
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await?;

        tracing::info!("Telemetry relay stopped");
        Ok(())
    }
}
