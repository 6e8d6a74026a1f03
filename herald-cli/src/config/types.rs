use std::time::Duration;

use herald_core::HubConfig;
use serde::{Deserialize, Serialize};

/// Default port for the herald server
pub const DEFAULT_PORT: u16 = 7433;
/// Default host for the herald server
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHeraldConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub hub: RawHubConfig,
}

/// Server config as stored in TOML (optional fields for proper merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    /// Host address to bind to
    pub host: Option<String>,

    /// Port for the herald server
    pub port: Option<u16>,
}

/// Hub tuning as stored in TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawHubConfig {
    pub replay_capacity: Option<usize>,
    pub eviction_batch: Option<usize>,
    pub min_retained: Option<usize>,
    #[serde(default, with = "humantime_serde")]
    pub keep_alive_interval: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub connection_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub shutdown_grace: Option<Duration>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeraldConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub hub: HubConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port for the herald server
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
