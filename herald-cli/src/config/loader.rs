use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use herald_core::HubConfig;

use super::types::{
    DEFAULT_HOST, DEFAULT_PORT, HeraldConfig, RawHeraldConfig, RawHubConfig, RawServerConfig,
    ServerConfig,
};

/// Env var overriding the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "HERALD_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<HeraldConfig> {
        let mut raw = RawHeraldConfig::default();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            raw = Self::merge_raw(raw, Self::read_raw(&user_path)?);
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            raw = Self::merge_raw(raw, Self::read_raw(&project_path)?);
        }

        Self::finalize(raw)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "herald").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with HERALD_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".herald/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<RawHeraldConfig> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawHeraldConfig, overlay: RawHeraldConfig) -> RawHeraldConfig {
        RawHeraldConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            hub: RawHubConfig {
                replay_capacity: overlay.hub.replay_capacity.or(base.hub.replay_capacity),
                eviction_batch: overlay.hub.eviction_batch.or(base.hub.eviction_batch),
                min_retained: overlay.hub.min_retained.or(base.hub.min_retained),
                keep_alive_interval: overlay
                    .hub
                    .keep_alive_interval
                    .or(base.hub.keep_alive_interval),
                connection_timeout: overlay
                    .hub
                    .connection_timeout
                    .or(base.hub.connection_timeout),
                shutdown_grace: overlay.hub.shutdown_grace.or(base.hub.shutdown_grace),
            },
        }
    }

    /// Convert raw config to final config with defaults applied, then validate
    fn finalize(raw: RawHeraldConfig) -> Result<HeraldConfig> {
        let defaults = HubConfig::default();
        let hub = HubConfig {
            replay_capacity: raw.hub.replay_capacity.unwrap_or(defaults.replay_capacity),
            eviction_batch: raw.hub.eviction_batch.unwrap_or(defaults.eviction_batch),
            min_retained: raw.hub.min_retained.unwrap_or(defaults.min_retained),
            keep_alive_interval: raw
                .hub
                .keep_alive_interval
                .unwrap_or(defaults.keep_alive_interval),
            connection_timeout: raw
                .hub
                .connection_timeout
                .unwrap_or(defaults.connection_timeout),
            shutdown_grace: raw.hub.shutdown_grace.unwrap_or(defaults.shutdown_grace),
        };
        hub.validate()?;

        Ok(HeraldConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: raw.server.port.unwrap_or(DEFAULT_PORT),
            },
            hub,
        })
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<HeraldConfig> {
        if path.exists() {
            Self::finalize(Self::read_raw(path)?)
        } else {
            Self::finalize(RawHeraldConfig::default())
        }
    }
}
