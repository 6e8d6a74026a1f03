//! Herald serve command for running the notification server
//!
//! The serve command runs the herald server which provides:
//! - SSE event stream with replay on reconnect
//! - Change ingest endpoint for the persistence layer
//! - Health endpoint with hub counters

use anyhow::Result;
use clap::Args;
use herald_server::{HeraldServer, ServerConfig};
use tracing::info;

use crate::config::{ConfigLoader, HeraldConfig};

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Host to bind to (overrides config)
    #[arg(long)]
    pub host: Option<String>,
}

impl ServeArgs {
    /// Apply command-line overrides on top of loaded configuration
    pub fn apply(&self, mut config: HeraldConfig) -> HeraldConfig {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        config
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.apply(ConfigLoader::load()?);

    info!(
        host = %config.server.host,
        port = config.server.port,
        replay_capacity = config.hub.replay_capacity,
        keep_alive = ?config.hub.keep_alive_interval,
        "Starting herald server"
    );

    let server_config = ServerConfig::new(config.server.host, config.server.port);
    let server = HeraldServer::new(server_config, config.hub)?;
    server.run().await?;

    Ok(())
}
