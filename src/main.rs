//! HTTP Relay
//!
//! A forward/reverse HTTP relay built with Tokio.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 HTTP RELAY                    │
//!                    │                                               │
//!   Client Request   │  ┌─────────┐    ┌─────────┐    ┌──────────┐ │
//!   ─────────────────┼─▶│   net   │───▶│  proxy  │───▶│  http    │ │
//!                    │  │listener │    │ session │    │  parser  │ │
//!                    │  └─────────┘    └────┬────┘    └──────────┘ │
//!                    │                      │ verbatim bytes        │
//!                    │                      ▼                       │
//!   Client Response  │               ┌──────────────┐              │
//!   ◀────────────────┼───────────────│   upstream   │◀─────────────┼──── Upstream
//!                    │               │  connection  │              │     Server
//!                    │               └──────────────┘              │
//!                    │                                               │
//!                    │  ┌─────────────────────────────────────────┐ │
//!                    │  │          Cross-Cutting Concerns          │ │
//!                    │  │  ┌────────┐ ┌─────────────┐ ┌─────────┐ │ │
//!                    │  │  │ config │ │observability│ │lifecycle│ │ │
//!                    │  │  └────────┘ └─────────────┘ └─────────┘ │ │
//!                    │  └─────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use http_relay::config::{self, ConfigError, RelayConfig};
use http_relay::lifecycle::{signals, Shutdown};
use http_relay::observability::logging;
use http_relay::proxy::RelayServer;

#[derive(Parser)]
#[command(name = "http-relay")]
#[command(about = "HTTP relay with incremental request parsing", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g., "0.0.0.0:8080").
    #[arg(long)]
    listen: Option<String>,

    /// Override the upstream address (e.g., "127.0.0.1:9090").
    #[arg(long)]
    upstream: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RelayConfig::default(),
    };

    if let Some(listen) = args.listen {
        config.listener.bind_address = listen;
    }
    if let Some(upstream) = args.upstream {
        config.upstream.address = upstream;
    }
    config::validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);

    tracing::info!("http-relay v0.1.0 starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        max_connections = config.listener.max_connections,
        "Configuration loaded"
    );

    let server = RelayServer::bind(&config).await?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        signals::shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(shutdown_rx).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
