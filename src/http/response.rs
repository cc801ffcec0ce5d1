//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map every terminal failure to a status code and plain-text message
//! - Keep transport details out of anything but the 500 message
//!
//! # Status Mapping
//! | Failure            | Status | Body                                  |
//! |--------------------|--------|---------------------------------------|
//! | Rejected host      | 403    | `Host {name} is not allowed.`         |
//! | No endpoint        | 404    | `Service instance not found`          |
//! | Unsupported method | 405    | `Method not allowed`                  |
//! | Body over limit    | 413    | `Request body too large`              |
//! | Dispatch failure   | 500    | `Error forwarding request: {message}` |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::forward::{DispatchError, ForwardError};
use crate::http::request::BodyTooLarge;
use crate::routing::Rejected;

/// Any outcome of the proxy pipeline other than a relayed response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Rejected(#[from] Rejected),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { service: String, limit: usize },
}

impl ProxyError {
    pub fn body_too_large(service: &str, err: BodyTooLarge) -> Self {
        ProxyError::BodyTooLarge {
            service: service.to_string(),
            limit: err.limit,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Rejected(_) => StatusCode::FORBIDDEN,
            ProxyError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Forward(ForwardError::EndpointNotFound { .. }) => StatusCode::NOT_FOUND,
            ProxyError::Forward(ForwardError::MethodNotAllowed(_)) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::Forward(ForwardError::ForwardingFailed { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the caller.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::Rejected(rejected) => rejected.to_string(),
            ProxyError::BodyTooLarge { .. } => "Request body too large".to_string(),
            ProxyError::Forward(ForwardError::EndpointNotFound { .. }) => {
                "Service instance not found".to_string()
            }
            ProxyError::Forward(ForwardError::MethodNotAllowed(_)) => "Method not allowed".to_string(),
            ProxyError::Forward(ForwardError::ForwardingFailed { source, .. }) => {
                forwarding_message(source)
            }
        }
    }

    /// Authorized service the request was bound for, if it got that far.
    pub fn service(&self) -> Option<&str> {
        match self {
            ProxyError::Rejected(_) | ProxyError::Forward(ForwardError::MethodNotAllowed(_)) => None,
            ProxyError::BodyTooLarge { service, .. }
            | ProxyError::Forward(ForwardError::EndpointNotFound { service, .. })
            | ProxyError::Forward(ForwardError::ForwardingFailed { service, .. }) => Some(service.as_str()),
        }
    }

    /// Pipeline stage that ended the request, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            ProxyError::Rejected(_) => "authorize",
            ProxyError::BodyTooLarge { .. } => "read_body",
            ProxyError::Forward(ForwardError::MethodNotAllowed(_)) => "method",
            ProxyError::Forward(ForwardError::EndpointNotFound { .. }) => "resolve",
            ProxyError::Forward(ForwardError::ForwardingFailed { .. }) => "dispatch",
        }
    }
}

fn forwarding_message(source: &DispatchError) -> String {
    format!("Error forwarding request: {}", source)
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
