//! Server error types

use herald_core::HubError;
use thiserror::Error;

/// Errors that can occur in the herald server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Hub could not be built from the given configuration
    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
