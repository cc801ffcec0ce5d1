//! Discovery-backed reverse proxy library.
//!
//! Requests are routed by their Host header: the name is checked against a
//! static allow-list, resolved to one endpoint through service discovery, and
//! the request is forwarded there with the response relayed back.

pub mod config;
pub mod discovery;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
