//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Authorized service name
//!     → resolver.rs (deadline, classification)
//!     → Discovery backend (static_table.rs | registry.rs)
//!     → Instance {host?, port?}
//!     → endpoint.rs (both fields required, port parsed)
//!     → Endpoint or ResolveError
//! ```
//!
//! # Design Decisions
//! - One fresh lookup per request; endpoints are never cached or reused
//! - Backends report failures as `DiscoveryError`; the resolver folds every
//!   failure into "not found" so a lookup can never take the request down
//! - Backends are injected as `Arc<dyn Discovery>` so tests can substitute stubs

pub mod endpoint;
pub mod registry;
pub mod resolver;
pub mod static_table;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::DiscoveryConfig;

pub use endpoint::{Endpoint, Instance};
pub use registry::RegistryDiscovery;
pub use resolver::{ResolveError, Resolver};
pub use static_table::StaticDiscovery;

/// Errors raised inside a discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registry returned status {0}")]
    Status(u16),

    #[error("malformed registry response: {0}")]
    Malformed(String),

    #[error("invalid registry URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("registry URL '{0}' cannot carry a path")]
    CannotBeABase(String),
}

impl From<serde_json::Error> for DiscoveryError {
    fn from(e: serde_json::Error) -> Self {
        DiscoveryError::Malformed(e.to_string())
    }
}

/// Maps a logical service name to at most one instance.
#[async_trait]
pub trait Discovery: Send + Sync + std::fmt::Debug {
    /// `Ok(None)` means the service has no registered instance.
    async fn discover(&self, service: &str) -> Result<Option<Instance>, DiscoveryError>;
}

/// Build the configured discovery backend.
pub fn build_discovery(
    config: &DiscoveryConfig,
    timeout: Duration,
) -> Result<Arc<dyn Discovery>, DiscoveryError> {
    match config {
        DiscoveryConfig::Static { instances } => {
            tracing::info!(services = instances.len(), "Using static discovery table");
            Ok(Arc::new(StaticDiscovery::from_config(instances)))
        }
        DiscoveryConfig::Registry(registry) => {
            tracing::info!(
                url = %registry.url,
                namespace = %registry.namespace,
                "Using HTTP service registry"
            );
            Ok(Arc::new(RegistryDiscovery::new(registry, timeout)?))
        }
    }
}
