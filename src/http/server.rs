//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, outer timeout)
//! - Run the pipeline per request: method → authorize → forward
//! - Serve on a listener until shutdown

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::discovery::{build_discovery, Discovery, DiscoveryError, Resolver};
use crate::forward::{Forwarder, RelayedResponse, Verb};
use crate::http::request::{read_inbound, request_id_of, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::ProxyError;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::authorizer::{host_of, AllowList};

/// Application state injected into handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub allow_list: Arc<AllowList>,
    pub forwarder: Forwarder,
    pub max_body_size: usize,
}

/// HTTP server for the discovery proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server using the discovery backend named in the configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, DiscoveryError> {
        let discovery = build_discovery(
            &config.discovery,
            Duration::from_secs(config.timeouts.discovery_secs),
        )?;
        Ok(Self::with_discovery(config, discovery))
    }

    /// Create a server around an explicit discovery backend.
    pub fn with_discovery(config: ProxyConfig, discovery: Arc<dyn Discovery>) -> Self {
        let allow_list = Arc::new(AllowList::new(config.routing.allowed_hosts.iter().cloned()));
        if allow_list.is_empty() {
            tracing::warn!("Allow-list is empty; every request will be rejected");
        }

        let resolver = Resolver::new(
            discovery,
            Duration::from_secs(config.timeouts.discovery_secs),
        );
        let forwarder = Forwarder::new(resolver, &config.timeouts);

        let state = AppState {
            allow_list,
            forwarder,
            max_body_size: config.security.max_body_size,
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID.clone()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID.clone(), MakeRequestUuidV4))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until shutdown fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            allowed_hosts = ?self.config.routing.allowed_hosts,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id_of(&request);
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "Proxying request"
    );

    let (service, response) = match route(&state, request).await {
        Ok((service, relayed)) => {
            tracing::info!(
                request_id = %request_id,
                service = %service,
                method = %method,
                path = %path,
                status = relayed.status.as_u16(),
                "Request relayed"
            );
            (Some(service), relayed.into_response())
        }
        Err(err) => {
            log_failure(&request_id, &method, &path, &err);
            (err.service().map(str::to_string), err.into_response())
        }
    };

    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        service.as_deref().unwrap_or("none"),
        start_time,
    );
    response
}

/// method → authorize → read body → forward.
async fn route(
    state: &AppState,
    request: Request<Body>,
) -> Result<(String, RelayedResponse), ProxyError> {
    let verb = Verb::try_from(request.method())?;
    let service = state.allow_list.authorize(&host_of(&request))?;

    let inbound = read_inbound(request, verb, state.max_body_size)
        .await
        .map_err(|e| ProxyError::body_too_large(&service, e))?;

    let relayed = state.forwarder.forward(&service, inbound).await?;
    Ok((service, relayed))
}

fn log_failure(request_id: &str, method: &axum::http::Method, path: &str, err: &ProxyError) {
    let status = err.status().as_u16();
    let stage = err.stage();
    if err.status().is_server_error() {
        tracing::error!(
            request_id = %request_id,
            method = %method,
            path = %path,
            stage,
            status,
            error = %err,
            "Request failed"
        );
    } else {
        tracing::warn!(
            request_id = %request_id,
            method = %method,
            path = %path,
            stage,
            status,
            error = %err,
            "Request refused"
        );
    }
}
