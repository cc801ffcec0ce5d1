use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use discovery_proxy::config::{load_config, DiscoveryConfig, ProxyConfig};
use discovery_proxy::discovery::{build_discovery, Resolver};
use discovery_proxy::routing::AllowList;

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Operator tooling for the discovery proxy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and print a summary
    Check {
        /// Path to the TOML configuration file
        config: PathBuf,
    },
    /// Resolve a service once through the configured discovery backend
    Resolve {
        #[arg(short, long)]
        config: PathBuf,

        /// Logical service name (as it would appear in the Host header)
        service: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&summary(&config))?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Resolve { config, service } => {
            let config = load_config(&config)?;
            let allow_list = AllowList::new(config.routing.allowed_hosts.iter().cloned());
            let authorized = allow_list.authorize(&service);
            if let Err(rejected) = &authorized {
                eprintln!("Warning: {}", rejected);
            }

            let timeout = Duration::from_secs(config.timeouts.discovery_secs);
            let resolver = Resolver::new(build_discovery(&config.discovery, timeout)?, timeout);

            match resolver.resolve(&service).await {
                Ok(endpoint) => {
                    let out = json!({
                        "service": service,
                        "allowed": authorized.is_ok(),
                        "endpoint": endpoint,
                        "url": format!("http://{}/", endpoint),
                    });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    eprintln!("Error: service instance not found: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}

fn summary(config: &ProxyConfig) -> serde_json::Value {
    let discovery = match &config.discovery {
        DiscoveryConfig::Static { instances } => json!({
            "kind": "static",
            "services": instances.keys().collect::<Vec<_>>(),
        }),
        DiscoveryConfig::Registry(registry) => json!({
            "kind": "registry",
            "url": registry.url,
            "namespace": registry.namespace,
        }),
    };

    json!({
        "bind_address": config.listener.bind_address,
        "allowed_hosts": config.routing.allowed_hosts,
        "discovery": discovery,
        "timeouts": config.timeouts,
        "max_body_size": config.security.max_body_size,
    })
}
