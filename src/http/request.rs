//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Enforce the inbound body size limit
//! - Reduce the axum request to an [`InboundRequest`]
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, and forwarded downstream
//! - Body is buffered in full; JSON parsing needs the whole payload

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::forward::{InboundRequest, Verb};

/// Header carrying the per-request correlation ID.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates a UUID v4 for requests that arrive without an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of a request, or `"unknown"`.
pub fn request_id_of<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// The inbound body exceeded the configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyTooLarge {
    pub limit: usize,
}

/// Buffer the body (up to `limit` bytes) and split out what forwarding needs.
pub async fn read_inbound(
    request: Request<Body>,
    verb: Verb,
    limit: usize,
) -> Result<InboundRequest, BodyTooLarge> {
    let (parts, body) = request.into_parts();

    let body = axum::body::to_bytes(body, limit)
        .await
        .map_err(|_| BodyTooLarge { limit })?;

    Ok(InboundRequest {
        verb,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body: (!body.is_empty()).then_some(body),
    })
}
