//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! (service name, InboundRequest)
//!     → discovery::Resolver (one fresh lookup)        → EndpointNotFound
//!     → outbound.rs (URL rewrite, header/body policy)
//!     → forwarder.rs (hyper client, dispatch deadline) → ForwardingFailed
//!     → relay.rs (drop Transfer-Encoding)
//!     → RelayedResponse
//! ```
//!
//! # Design Decisions
//! - Verb-specific behaviour lives in `Verb`, not in branches at the call site
//! - Responses are buffered in full before relaying. Response size is bounded
//!   by memory; this is a known scalability limit, not streaming
//! - No retries: one resolution and one dispatch per inbound request

pub mod forwarder;
pub mod outbound;
pub mod relay;
pub mod verb;

use axum::http::Method;
use std::time::Duration;
use thiserror::Error;

use crate::discovery::{Endpoint, ResolveError};

pub use forwarder::Forwarder;
pub use outbound::{InboundRequest, OutboundRequest};
pub use relay::RelayedResponse;
pub use verb::Verb;

/// Terminal failures of the forwarding pipeline.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("no endpoint for service '{service}': {cause}")]
    EndpointNotFound {
        service: String,
        #[source]
        cause: ResolveError,
    },

    #[error("method {0} is not forwarded")]
    MethodNotAllowed(Method),

    #[error("forwarding to '{service}' at {endpoint} failed: {source}")]
    ForwardingFailed {
        service: String,
        endpoint: Endpoint,
        #[source]
        source: DispatchError,
    },
}

/// Transport-level failures while talking to the resolved endpoint.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid outbound URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("failed to build outbound request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("{}", describe_chain(.0))]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),

    #[error("no response within {0:?}")]
    TimedOut(Duration),
}

/// `outer: inner: innermost` for an error and its sources.
fn describe_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("inner")]
    struct Inner;

    #[test]
    fn test_describe_chain() {
        assert_eq!(describe_chain(&Outer(Inner)), "outer: inner");
    }

    #[test]
    fn test_timeout_message() {
        let err = DispatchError::TimedOut(Duration::from_secs(30));
        assert_eq!(err.to_string(), "no response within 30s");
    }
}
