//! Shared application state for the herald server

use std::sync::Arc;

use chrono::{DateTime, Utc};
use herald_core::{DomainEventAdapter, Hub, HubConfig, HubError, InMemoryChannelDirectory};
use tokio_util::sync::CancellationToken;

/// Shared application state accessible by all handlers
#[derive(Clone)]
pub struct AppState {
    /// The notification hub
    pub hub: Arc<Hub>,
    /// Channel projection fed by ingested changes
    pub directory: Arc<InMemoryChannelDirectory>,
    /// Routes ingested changes to recipients
    pub adapter: Arc<DomainEventAdapter>,
    /// Cancelled when the server shuts down; open streams end on it
    pub shutdown: CancellationToken,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state with a fresh hub and an empty channel directory
    pub fn new(config: HubConfig) -> Result<Self, HubError> {
        Ok(Self::with_hub(Arc::new(Hub::new(config)?)))
    }

    /// Create state around an existing hub (for testing)
    pub fn with_hub(hub: Arc<Hub>) -> Self {
        let directory = Arc::new(InMemoryChannelDirectory::new());
        let adapter = Arc::new(DomainEventAdapter::new(directory.clone()));

        Self {
            hub,
            directory,
            adapter,
            shutdown: CancellationToken::new(),
            started_at: Utc::now(),
        }
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
