//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid)
//! - Keep the request deadline above the lookup and dispatch deadlines
//! - Reject allow-list entries that can never match a host header
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{DiscoveryConfig, ProxyConfig};
use crate::discovery::endpoint::parse_port;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("routing.allowed_hosts contains an empty entry")]
    EmptyHost,

    #[error("routing.allowed_hosts entry '{0}' contains ':' and can never match")]
    HostWithPort(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error(
        "timeouts.request_secs ({request}) must exceed discovery_secs + dispatch_secs ({inner})"
    )]
    RequestTimeoutTooShort { request: u64, inner: u64 },

    #[error("discovery.url '{0}' is not a valid URL")]
    RegistryUrl(String),

    #[error("discovery.namespace must not be empty")]
    EmptyNamespace,

    #[error("static instance '{service}' has invalid port '{port}'")]
    StaticPort { service: String, port: String },

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for host in &config.routing.allowed_hosts {
        if host.is_empty() {
            errors.push(ValidationError::EmptyHost);
        } else if host.contains(':') {
            errors.push(ValidationError::HostWithPort(host.clone()));
        }
    }

    let timeouts = [
        ("connect_secs", config.timeouts.connect_secs),
        ("discovery_secs", config.timeouts.discovery_secs),
        ("dispatch_secs", config.timeouts.dispatch_secs),
        ("request_secs", config.timeouts.request_secs),
    ];
    for (name, value) in timeouts {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    // The outer request deadline must not pre-empt the lookup or dispatch
    // deadlines, otherwise their 404/500 answers turn into a bare 408.
    let inner = config
        .timeouts
        .discovery_secs
        .saturating_add(config.timeouts.dispatch_secs);
    if config.timeouts.request_secs <= inner {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: config.timeouts.request_secs,
            inner,
        });
    }

    match &config.discovery {
        DiscoveryConfig::Static { instances } => {
            for (service, instance) in instances {
                let port = instance.port.to_string();
                if parse_port(&port).is_none() {
                    errors.push(ValidationError::StaticPort {
                        service: service.clone(),
                        port,
                    });
                }
            }
        }
        DiscoveryConfig::Registry(registry) => {
            if url::Url::parse(&registry.url).is_err() {
                errors.push(ValidationError::RegistryUrl(registry.url.clone()));
            }
            if registry.namespace.is_empty() {
                errors.push(ValidationError::EmptyNamespace);
            }
        }
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
