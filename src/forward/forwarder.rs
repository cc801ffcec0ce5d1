//! Resolve → dispatch → relay.

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::discovery::Resolver;
use crate::forward::outbound::{InboundRequest, OutboundRequest};
use crate::forward::relay::RelayedResponse;
use crate::forward::{DispatchError, ForwardError};
use crate::resilience::timeouts::with_deadline;

/// Forwards authorized requests to a freshly resolved endpoint.
#[derive(Clone, Debug)]
pub struct Forwarder {
    resolver: Resolver,
    client: Client<HttpConnector, Body>,
    dispatch_timeout: Duration,
}

impl Forwarder {
    pub fn new(resolver: Resolver, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            resolver,
            client,
            dispatch_timeout: Duration::from_secs(timeouts.dispatch_secs),
        }
    }

    /// One resolution, one dispatch. No retries.
    pub async fn forward(
        &self,
        service: &str,
        inbound: InboundRequest,
    ) -> Result<RelayedResponse, ForwardError> {
        let endpoint = self
            .resolver
            .resolve(service)
            .await
            .map_err(|cause| ForwardError::EndpointNotFound {
                service: service.to_string(),
                cause,
            })?;

        let failed = |source| ForwardError::ForwardingFailed {
            service: service.to_string(),
            endpoint: endpoint.clone(),
            source,
        };

        let outbound = OutboundRequest::build(&endpoint, &inbound).map_err(failed)?;
        tracing::debug!(
            service = %service,
            method = %outbound.method,
            uri = %outbound.uri,
            "Dispatching request"
        );

        let relayed = self.dispatch(outbound).await.map_err(failed)?;
        tracing::debug!(
            service = %service,
            endpoint = %endpoint,
            status = %relayed.status,
            bytes = relayed.body.len(),
            "Relaying response"
        );
        Ok(relayed)
    }

    /// Issue the request and read the whole response body within the dispatch deadline.
    async fn dispatch(&self, outbound: OutboundRequest) -> Result<RelayedResponse, DispatchError> {
        let request = outbound.into_http()?;

        let exchange = async {
            let response = self.client.request(request).await?;
            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), usize::MAX)
                .await
                .map_err(DispatchError::Body)?;
            Ok::<_, DispatchError>(RelayedResponse::from_downstream(parts.status, parts.headers, body))
        };

        with_deadline(self.dispatch_timeout, exchange)
            .await
            .map_err(|_| DispatchError::TimedOut(self.dispatch_timeout))?
    }
}
