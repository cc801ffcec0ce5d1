//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration for the discovery proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Host allow-list.
    pub routing: RoutingConfig,

    /// Service discovery backend.
    pub discovery: DiscoveryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Which logical service names the proxy may route to.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Service names matched exactly (case-sensitive) against the Host header,
    /// port suffix stripped.
    pub allowed_hosts: Vec<String>,
}

/// Service discovery backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryConfig {
    /// Fixed table of service name -> instance.
    Static {
        #[serde(default)]
        instances: BTreeMap<String, StaticInstanceConfig>,
    },

    /// Remote HTTP service registry.
    Registry(RegistryConfig),
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig::Static {
            instances: BTreeMap::new(),
        }
    }
}

/// A statically configured instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticInstanceConfig {
    pub host: String,

    /// Port as written in the file; strings and integers are both accepted.
    pub port: PortValue,
}

/// A port that may be spelled as a string or an integer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for PortValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortValue::Number(n) => write!(f, "{}", n),
            PortValue::Text(s) => f.write_str(s),
        }
    }
}

/// HTTP service registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistryConfig {
    /// Base URL of the registry API.
    pub url: String,

    /// Namespace the services are registered under.
    pub namespace: String,

    /// Instance attribute holding the host address.
    #[serde(default = "default_host_attribute")]
    pub host_attribute: String,

    /// Instance attribute holding the port.
    #[serde(default = "default_port_attribute")]
    pub port_attribute: String,
}

fn default_host_attribute() -> String {
    "AWS_INSTANCE_IPV4".to_string()
}

fn default_port_attribute() -> String {
    "AWS_INSTANCE_PORT".to_string()
}

/// Timeout configuration for the two blocking stages of a request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout to the resolved endpoint, in seconds.
    pub connect_secs: u64,

    /// Deadline for one discovery lookup, in seconds.
    pub discovery_secs: u64,

    /// Deadline for the outbound exchange including the full response body, in seconds.
    pub dispatch_secs: u64,

    /// Outer deadline for the whole inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            discovery_secs: 5,
            dispatch_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
