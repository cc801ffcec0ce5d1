//! Discovery Proxy
//!
//! A reverse proxy that routes by Host header through service discovery.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌──────────────────────────────────────────────────────┐
//!                              │                   DISCOVERY PROXY                    │
//!                              │                                                      │
//!     Client Request           │  ┌─────────┐    ┌────────────┐    ┌──────────────┐  │
//!     ─────────────────────────┼─▶│  http   │───▶│  routing   │───▶│  discovery   │◀─┼──── Registry
//!                              │  │ server  │    │ allow-list │    │   resolver   │  │
//!                              │  └─────────┘    └────────────┘    └──────┬───────┘  │
//!                              │                                          │          │
//!                              │                                          ▼          │
//!     Client Response          │  ┌─────────┐                      ┌──────────────┐  │
//!     ◀────────────────────────┼──│ relay   │◀─────────────────────│  forwarder   │◀─┼──── Backend
//!                              │  └─────────┘                      └──────────────┘  │
//!                              │                                                      │
//!                              │  config · observability · resilience · lifecycle     │
//!                              └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use discovery_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use discovery_proxy::lifecycle::{wait_for_signal, Shutdown};
use discovery_proxy::observability::{logging, metrics};
use discovery_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "discovery-proxy")]
#[command(about = "Reverse proxy that resolves Host headers through service discovery", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init_tracing(&config.observability);

    tracing::info!("discovery-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = ?args.config,
        bind_address = %config.listener.bind_address,
        allowed_hosts = config.routing.allowed_hosts.len(),
        discovery_timeout_secs = config.timeouts.discovery_secs,
        dispatch_timeout_secs = config.timeouts.dispatch_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    let shutdown = Shutdown::new();
    let mut serve = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut serve => {
            result??;
            return Ok(());
        }
        _ = wait_for_signal() => {
            tracing::info!("Shutdown signal received");
            shutdown.trigger();
        }
    }

    serve.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
