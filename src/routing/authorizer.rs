//! Host-based authorization.
//!
//! # Responsibilities
//! - Extract the logical service name from the Host header
//! - Check it against the configured allow-list
//!
//! # Design Decisions
//! - Matching is exact and case-sensitive
//! - The port suffix (`svc:8080`) is stripped before lookup
//! - Pure lookup: no discovery or backend traffic happens here

use axum::http::{header, Request};
use std::collections::HashSet;
use thiserror::Error;

/// Host was not on the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Host {host} is not allowed.")]
pub struct Rejected {
    /// The service name that was looked up (port already stripped).
    pub host: String,
}

/// Fixed set of logical service names the proxy may route to.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    hosts: HashSet<String>,
}

impl AllowList {
    /// Build an allow-list from configured names.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
        }
    }

    /// Authorize a raw Host header value, returning the service name on success.
    pub fn authorize(&self, host_header: &str) -> Result<String, Rejected> {
        let service = service_name(host_header);
        if self.hosts.contains(service) {
            Ok(service.to_string())
        } else {
            Err(Rejected {
                host: service.to_string(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

/// The part of a Host header before the first `:`.
pub fn service_name(host_header: &str) -> &str {
    host_header.split(':').next().unwrap_or_default()
}

/// Raw host of a request: the Host header, or the URI authority when the
/// client sent none (HTTP/2 `:authority`).
pub fn host_of<B>(req: &Request<B>) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn allow_list() -> AllowList {
        AllowList::new(["auth-preprod", "example.com"])
    }

    #[test]
    fn test_allowed_host() {
        assert_eq!(allow_list().authorize("auth-preprod").unwrap(), "auth-preprod");
    }

    #[test]
    fn test_port_suffix_stripped() {
        assert_eq!(allow_list().authorize("auth-preprod:80").unwrap(), "auth-preprod");
        assert_eq!(allow_list().authorize("example.com:8443").unwrap(), "example.com");
    }

    #[test]
    fn test_rejection_names_host() {
        let err = allow_list().authorize("evil.com").unwrap_err();
        assert_eq!(err.host, "evil.com");
        assert_eq!(err.to_string(), "Host evil.com is not allowed.");

        let err = allow_list().authorize("evil.com:80").unwrap_err();
        assert_eq!(err.to_string(), "Host evil.com is not allowed.");
    }

    #[test]
    fn test_case_sensitive() {
        assert!(allow_list().authorize("AUTH-PREPROD").is_err());
        assert!(allow_list().authorize("Example.com").is_err());
    }

    #[test]
    fn test_empty_host_rejected() {
        let err = allow_list().authorize("").unwrap_err();
        assert_eq!(err.host, "");
    }

    #[test]
    fn test_host_of_prefers_header() {
        let req = Request::builder()
            .uri("http://other:1/x")
            .header("Host", "auth-preprod:80")
            .body(Body::empty())
            .unwrap();
        assert_eq!(host_of(&req), "auth-preprod:80");

        let req = Request::builder()
            .uri("http://auth-preprod:9/x")
            .body(Body::empty())
            .unwrap();
        assert_eq!(host_of(&req), "auth-preprod:9");

        let req = Request::builder().uri("/x").body(Body::empty()).unwrap();
        assert_eq!(host_of(&req), "");
    }
}
