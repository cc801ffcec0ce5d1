//! Per-request endpoint resolution.
//!
//! # Responsibilities
//! - Run one discovery lookup under a deadline
//! - Turn the raw instance into an [`Endpoint`]
//! - Classify every failure so the caller can log it, while treating all of
//!   them as "not found"

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::discovery::{Discovery, DiscoveryError, Endpoint};
use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;

/// Why a lookup produced no usable endpoint.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no instance registered")]
    NoInstance,

    #[error("incomplete instance record (host present: {has_host}, port present: {has_port})")]
    Incomplete { has_host: bool, has_port: bool },

    #[error("invalid port '{0}'")]
    InvalidPort(String),

    #[error("lookup timed out after {0:?}")]
    TimedOut(Duration),

    #[error("discovery backend failed: {0}")]
    Backend(#[from] DiscoveryError),
}

impl ResolveError {
    /// Short label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ResolveError::NoInstance => "not_found",
            ResolveError::Incomplete { .. } => "incomplete",
            ResolveError::InvalidPort(_) => "invalid_port",
            ResolveError::TimedOut(_) => "timeout",
            ResolveError::Backend(_) => "error",
        }
    }
}

/// Resolves service names through a discovery backend. Nothing is cached.
#[derive(Clone)]
pub struct Resolver {
    discovery: Arc<dyn Discovery>,
    timeout: Duration,
}

impl Resolver {
    pub fn new(discovery: Arc<dyn Discovery>, timeout: Duration) -> Self {
        Self { discovery, timeout }
    }

    /// Look up one endpoint for `service`.
    pub async fn resolve(&self, service: &str) -> Result<Endpoint, ResolveError> {
        let result = match with_deadline(self.timeout, self.discovery.discover(service)).await {
            Ok(Ok(Some(instance))) => Endpoint::try_from(instance),
            Ok(Ok(None)) => Err(ResolveError::NoInstance),
            Ok(Err(e)) => Err(ResolveError::Backend(e)),
            Err(_) => Err(ResolveError::TimedOut(self.timeout)),
        };

        match &result {
            Ok(endpoint) => {
                tracing::debug!(service = %service, endpoint = %endpoint, "Resolved endpoint");
                metrics::record_discovery(service, "found");
            }
            Err(e) => {
                tracing::warn!(service = %service, error = %e, "Endpoint resolution failed");
                metrics::record_discovery(service, e.outcome());
            }
        }

        result
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("discovery", &self.discovery)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::Instance;
    use async_trait::async_trait;

    #[derive(Debug)]
    enum Answer {
        Found(Instance),
        Missing,
        Broken,
        Hang,
    }

    #[derive(Debug)]
    struct Fixed(Answer);

    #[async_trait]
    impl Discovery for Fixed {
        async fn discover(&self, _service: &str) -> Result<Option<Instance>, DiscoveryError> {
            match &self.0 {
                Answer::Found(instance) => Ok(Some(instance.clone())),
                Answer::Missing => Ok(None),
                Answer::Broken => Err(DiscoveryError::Malformed("truncated".into())),
                Answer::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(None)
                }
            }
        }
    }

    fn resolver(answer: Answer) -> Resolver {
        Resolver::new(Arc::new(Fixed(answer)), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_found() {
        let endpoint = resolver(Answer::Found(Instance::new("10.0.0.5", "9000")))
            .resolve("svc")
            .await
            .unwrap();
        assert_eq!(endpoint.to_string(), "10.0.0.5:9000");
    }

    #[tokio::test]
    async fn test_missing() {
        let err = resolver(Answer::Missing).resolve("svc").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoInstance));
    }

    #[tokio::test]
    async fn test_backend_error_is_contained() {
        let err = resolver(Answer::Broken).resolve("svc").await.unwrap_err();
        assert_eq!(err.outcome(), "error");
        assert!(err.to_string().contains("truncated"));
    }

    #[tokio::test]
    async fn test_partial_record() {
        let partial = Instance {
            host: None,
            port: Some("9000".into()),
        };
        let err = resolver(Answer::Found(partial)).resolve("svc").await.unwrap_err();
        assert_eq!(err.outcome(), "incomplete");
    }

    #[tokio::test]
    async fn test_lookup_deadline() {
        let err = resolver(Answer::Hang).resolve("svc").await.unwrap_err();
        assert!(matches!(err, ResolveError::TimedOut(_)));
    }
}
