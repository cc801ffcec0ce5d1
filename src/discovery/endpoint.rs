//! Discovered instances and resolved endpoints.

use serde::Serialize;
use std::fmt;

use crate::discovery::resolver::ResolveError;

/// Raw record returned by a discovery backend.
///
/// Either field may be missing; only a record with both becomes an [`Endpoint`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instance {
    pub host: Option<String>,
    pub port: Option<String>,
}

impl Instance {
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port.into()),
        }
    }
}

/// One running instance of a service, resolved for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Host formatted for use inside a URL authority (IPv6 literals bracketed).
    pub fn url_host(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.url_host(), self.port)
    }
}

impl TryFrom<Instance> for Endpoint {
    type Error = ResolveError;

    fn try_from(instance: Instance) -> Result<Self, Self::Error> {
        // Empty strings count as missing.
        let host = instance.host.filter(|h| !h.trim().is_empty());
        let port = instance.port.filter(|p| !p.trim().is_empty());

        match (host, port) {
            (Some(host), Some(port)) => {
                let port = parse_port(&port).ok_or(ResolveError::InvalidPort(port))?;
                Ok(Endpoint {
                    host: host.trim().to_string(),
                    port,
                })
            }
            (host, port) => Err(ResolveError::Incomplete {
                has_host: host.is_some(),
                has_port: port.is_some(),
            }),
        }
    }
}

/// Parse a port given as text. Zero is not a usable port.
pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok().filter(|p| *p != 0)
}
