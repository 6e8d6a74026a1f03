//! herald-server - HTTP and SSE server for the herald notification hub
//!
//! This crate owns the hub at runtime: it exposes the event stream, the
//! change ingest endpoint and health, and runs the keep-alive task for the
//! lifetime of the server.

mod error;
pub mod http;
pub mod middleware;
mod state;

use std::future::Future;
use std::sync::Arc;

use herald_core::{HubConfig, KeepAlive};
use tokio::net::TcpListener;

pub use error::ServerError;
pub use http::create_router;
pub use middleware::{RECIPIENT_HEADER, Recipient};
pub use state::AppState;

/// The main herald server
pub struct HeraldServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HeraldServer {
    /// Create a new server with a fresh hub
    pub fn new(config: ServerConfig, hub_config: HubConfig) -> Result<Self, ServerError> {
        Ok(Self {
            config,
            state: Arc::new(AppState::new(hub_config)?),
        })
    }

    /// Create a server with custom state (for testing)
    pub fn with_state(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the shared application state
    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address, until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("herald server listening on {}", addr);

        self.run_with_listener(listener).await
    }

    /// Run on an already bound listener until Ctrl-C
    pub async fn run_with_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run on an already bound listener until `signal` resolves.
    ///
    /// On shutdown open event streams are ended, then the keep-alive task is
    /// given the configured grace period to stop.
    pub async fn run_until<F>(self, listener: TcpListener, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let hub = Arc::clone(&self.state.hub);
        let grace = hub.config().shutdown_grace;
        let keep_alive = KeepAlive::start(Arc::clone(&hub));

        let streams = self.state.shutdown.clone();
        let router = create_router(self.state);

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                signal.await;
                tracing::info!("Shutdown requested, closing event streams");
                streams.cancel();
            })
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        if !keep_alive.shutdown(grace).await {
            tracing::warn!("Keep-alive task did not stop cleanly");
        }
        let last_event_id = hub.last_event_id().await;
        tracing::info!(
            listeners = hub.listener_count(),
            last_event_id = %last_event_id,
            "herald server stopped"
        );

        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7433,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with the specified host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:7433")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 7433);
    }

    #[test]
    fn test_server_config_addr() {
        let config = ServerConfig::new("127.0.0.1", 8080);
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_herald_server_new() {
        let config = ServerConfig::default();
        let server = HeraldServer::new(config.clone(), HubConfig::default()).unwrap();
        assert_eq!(server.config().addr(), config.addr());
    }

    #[test]
    fn test_herald_server_rejects_invalid_hub_config() {
        let hub_config = HubConfig::default().with_eviction_batch(0);
        let result = HeraldServer::new(ServerConfig::default(), hub_config);
        assert!(matches!(result, Err(ServerError::Hub(_))));
    }

    #[test]
    fn test_herald_server_with_state() {
        let config = ServerConfig::new("127.0.0.1", 9000);
        let state = Arc::new(AppState::new(HubConfig::default()).unwrap());
        let server = HeraldServer::with_state(config, state);
        assert_eq!(server.config().port, 9000);
    }
}
