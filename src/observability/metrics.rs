//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, service
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_discovery_lookups_total` (counter): lookups by service, outcome
//!
//! # Design Decisions
//! - Service label only carries allow-listed names (bounded cardinality)
//! - Recording is a no-op until a recorder is installed

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished proxied request.
pub fn record_request(method: &str, status: u16, service: &str, start_time: Instant) {
    counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "service" => service.to_string()
    )
    .increment(1);

    histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "service" => service.to_string()
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record the outcome of one discovery lookup.
pub fn record_discovery(service: &str, outcome: &'static str) {
    counter!(
        "proxy_discovery_lookups_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
