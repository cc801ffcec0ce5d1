//! Inbound → outbound request translation.
//!
//! # Responsibilities
//! - Rewrite the target to `http://{host}:{port}{path}`
//! - Copy headers, minus Host and the framing headers of the old body
//! - Apply the verb's query and body strategy
//!
//! # Design Decisions
//! - Path is appended verbatim, no normalization
//! - The JSON body is re-serialized, so Content-Length is recomputed by the client
//! - Non-JSON payloads do not round-trip for body-carrying verbs

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};

use crate::discovery::Endpoint;
use crate::forward::verb::{BodyPolicy, Verb};
use crate::forward::DispatchError;

/// The request as received, reduced to what forwarding needs.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub verb: Verb,
    /// Raw path, always starting with `/`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// The request sent to the resolved endpoint.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Derive the outbound request for `endpoint`.
    pub fn build(endpoint: &Endpoint, inbound: &InboundRequest) -> Result<Self, DispatchError> {
        let query = if inbound.verb.forwards_query() {
            inbound.query.as_deref()
        } else {
            None
        };
        let url = target_url(endpoint, &inbound.path, query);
        let uri = Uri::try_from(url.as_str()).map_err(|source| DispatchError::InvalidUrl { url, source })?;

        let mut headers = forwarded_headers(&inbound.headers);
        let body = match inbound.verb.body_policy() {
            BodyPolicy::Drop => None,
            BodyPolicy::Json => json_body(inbound.body.as_ref()),
        };
        if body.is_some() && !headers.contains_key(header::CONTENT_TYPE) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        Ok(Self {
            method: inbound.verb.method(),
            uri,
            headers,
            body,
        })
    }

    /// Convert into a request for the HTTP client.
    pub fn into_http(self) -> Result<Request<Body>, DispatchError> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(headers) = builder.headers_mut() {
            headers.extend(self.headers);
        }
        let body = match self.body {
            Some(bytes) => Body::from(bytes),
            None => Body::empty(),
        };
        Ok(builder.body(body)?)
    }
}

/// `http://{host}:{port}{path}[?{query}]`. An empty path becomes `/`.
pub fn target_url(endpoint: &Endpoint, path: &str, query: Option<&str>) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut url = format!("http://{}:{}/{}", endpoint.url_host(), endpoint.port, path);
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(query);
    }
    url
}

/// Inbound headers minus Host and the framing of the inbound body.
pub fn forwarded_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
    headers
}

/// Parse and re-serialize a JSON body. Absent, invalid or `null` input yields no body.
pub fn json_body(raw: Option<&Bytes>) -> Option<Bytes> {
    let raw = raw.filter(|b| !b.is_empty())?;
    match serde_json::from_slice::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Null) => None,
        Ok(value) => serde_json::to_vec(&value).ok().map(Bytes::from),
        Err(e) => {
            tracing::debug!(error = %e, "Inbound body is not JSON; forwarding without body");
            None
        }
    }
}
