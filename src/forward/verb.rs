//! Per-method forwarding strategy.

use axum::http::Method;

use crate::forward::ForwardError;

/// Methods the proxy forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

/// What happens to the inbound body for a verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Nothing is sent downstream.
    Drop,
    /// Parsed as JSON and re-serialized; unparsable input becomes no body.
    Json,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Verb::Get => Method::GET,
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        }
    }

    /// Only GET carries the inbound query string downstream.
    pub fn forwards_query(self) -> bool {
        matches!(self, Verb::Get)
    }

    pub fn body_policy(self) -> BodyPolicy {
        match self {
            Verb::Post | Verb::Put | Verb::Patch => BodyPolicy::Json,
            Verb::Get | Verb::Delete => BodyPolicy::Drop,
        }
    }
}

impl TryFrom<&Method> for Verb {
    type Error = ForwardError;

    fn try_from(method: &Method) -> Result<Self, Self::Error> {
        match *method {
            Method::GET => Ok(Verb::Get),
            Method::POST => Ok(Verb::Post),
            Method::PUT => Ok(Verb::Put),
            Method::PATCH => Ok(Verb::Patch),
            Method::DELETE => Ok(Verb::Delete),
            _ => Err(ForwardError::MethodNotAllowed(method.clone())),
        }
    }
}
