//! Error types for herald-core

use thiserror::Error;

/// Errors surfaced by hub construction and input parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HubError {
    #[error("Invalid hub configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid event id: {0:?}")]
    InvalidEventId(String),
}

/// Why a listener could not accept an event
///
/// Always recovered locally by removing the listener; never surfaced past
/// the dispatcher.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("Listener connection is gone")]
    Disconnected,

    #[error("Listener was closed")]
    Closed,
}
