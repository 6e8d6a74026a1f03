//! Hub tuning knobs
//!
//! None of these are policy baked into the algorithms; the embedding
//! application injects them (the CLI loads them from TOML).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HubError;

/// Configuration for the replay buffer, keep-alive and connection lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Maximum number of events kept for replay before eviction kicks in.
    #[serde(default = "default_replay_capacity")]
    pub replay_capacity: usize,

    /// How many of the oldest events are evicted in one pass.
    #[serde(default = "default_eviction_batch")]
    pub eviction_batch: usize,

    /// Eviction never shrinks the buffer below this many events.
    #[serde(default)]
    pub min_retained: usize,

    /// Period of the keep-alive heartbeat.
    #[serde(default = "default_keep_alive_interval", with = "humantime_serde")]
    pub keep_alive_interval: Duration,

    /// Lifetime of a streaming connection before the server ends it and the
    /// client is expected to reconnect with its last seen id.
    #[serde(default = "default_connection_timeout", with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// How long shutdown waits for the keep-alive task before aborting it.
    #[serde(default = "default_shutdown_grace", with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

fn default_replay_capacity() -> usize {
    1_000_000
}

fn default_eviction_batch() -> usize {
    100_000
}

fn default_keep_alive_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_connection_timeout() -> Duration {
    Duration::from_secs(30 * 60)
}

fn default_shutdown_grace() -> Duration {
    Duration::from_secs(5)
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            replay_capacity: default_replay_capacity(),
            eviction_batch: default_eviction_batch(),
            min_retained: 0,
            keep_alive_interval: default_keep_alive_interval(),
            connection_timeout: default_connection_timeout(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

impl HubConfig {
    #[must_use]
    pub fn with_replay_capacity(mut self, capacity: usize) -> Self {
        self.replay_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_eviction_batch(mut self, batch: usize) -> Self {
        self.eviction_batch = batch;
        self
    }

    #[must_use]
    pub fn with_min_retained(mut self, min_retained: usize) -> Self {
        self.min_retained = min_retained;
        self
    }

    #[must_use]
    pub fn with_keep_alive_interval(mut self, interval: Duration) -> Self {
        self.keep_alive_interval = interval;
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Reject combinations the store and scheduler cannot honour.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.replay_capacity == 0 {
            return Err(HubError::InvalidConfig(
                "replay_capacity must be at least 1".to_string(),
            ));
        }
        if self.eviction_batch == 0 {
            return Err(HubError::InvalidConfig(
                "eviction_batch must be at least 1".to_string(),
            ));
        }
        if self.min_retained >= self.replay_capacity {
            return Err(HubError::InvalidConfig(format!(
                "min_retained ({}) must be below replay_capacity ({})",
                self.min_retained, self.replay_capacity
            )));
        }
        if self.keep_alive_interval.is_zero() {
            return Err(HubError::InvalidConfig(
                "keep_alive_interval must be non-zero".to_string(),
            ));
        }
        if self.connection_timeout.is_zero() {
            return Err(HubError::InvalidConfig(
                "connection_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
