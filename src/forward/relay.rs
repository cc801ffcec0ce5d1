//! Downstream response relay.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

/// A fully buffered downstream response, ready to return to the caller.
#[derive(Debug, Clone)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RelayedResponse {
    /// Keep status, headers and body, dropping Transfer-Encoding: the body is
    /// already complete, so its length is known.
    pub fn from_downstream(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Self {
        headers.remove(header::TRANSFER_ENCODING);
        Self {
            status,
            headers,
            body,
        }
    }
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
