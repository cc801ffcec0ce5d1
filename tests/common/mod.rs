//! Shared utilities for integration testing.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Method, Request, Response, StatusCode},
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use discovery_proxy::discovery::{Discovery, DiscoveryError, Instance};
use discovery_proxy::ProxyConfig;

/// What a [`StubDiscovery`] answers.
#[derive(Debug, Clone)]
pub enum Answer {
    Found(Instance),
    Missing,
    Fails,
    Slow(Duration),
}

/// Discovery stub that counts lookups.
#[derive(Debug)]
pub struct StubDiscovery {
    answer: Answer,
    calls: AtomicUsize,
}

impl StubDiscovery {
    pub fn new(answer: Answer) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn at(addr: SocketAddr) -> Arc<Self> {
        Self::new(Answer::Found(Instance::new(
            addr.ip().to_string(),
            addr.port().to_string(),
        )))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Discovery for StubDiscovery {
    async fn discover(&self, _service: &str) -> Result<Option<Instance>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Answer::Found(instance) => Ok(Some(instance.clone())),
            Answer::Missing => Ok(None),
            Answer::Fails => Err(DiscoveryError::Status(503)),
            Answer::Slow(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(None)
            }
        }
    }
}

/// Proxy config allowing `hosts`, with short timeouts for tests.
pub fn proxy_config(hosts: &[&str]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.routing.allowed_hosts = hosts.iter().map(|h| h.to_string()).collect();
    config.timeouts.connect_secs = 1;
    config.timeouts.discovery_secs = 1;
    config.timeouts.dispatch_secs = 2;
    config.timeouts.request_secs = 10;
    config
}

/// A request as seen by a capturing backend.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Canned reply of a capturing backend.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: &'static str,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body,
            delay: Duration::ZERO,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct BackendState {
    reply: Reply,
    seen: Arc<Mutex<Vec<Captured>>>,
}

/// Handle to a running capturing backend.
#[derive(Clone)]
pub struct CaptureBackend {
    pub addr: SocketAddr,
    seen: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureBackend {
    pub fn requests(&self) -> Vec<Captured> {
        self.seen.lock().unwrap().clone()
    }

    pub fn only_request(&self) -> Captured {
        let seen = self.requests();
        assert_eq!(seen.len(), 1, "expected exactly one backend request");
        seen.into_iter().next().unwrap()
    }
}

async fn capture(State(state): State<BackendState>, request: Request<Body>) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    state.seen.lock().unwrap().push(Captured {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    });

    if !state.reply.delay.is_zero() {
        tokio::time::sleep(state.reply.delay).await;
    }

    let mut builder = Response::builder().status(state.reply.status);
    for (name, value) in &state.reply.headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::from(state.reply.body)).unwrap()
}

/// Start an axum backend on an ephemeral port that records every request.
pub async fn start_capture_backend(reply: Reply) -> CaptureBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new().fallback(capture).with_state(BackendState {
        reply,
        seen: seen.clone(),
    });
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    CaptureBackend { addr, seen }
}

/// Start a raw TCP backend that answers every request with `response` verbatim.
pub async fn start_raw_backend(response: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut request = Vec::new();
                        let mut buf = [0u8; 1024];
                        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => return,
                                Ok(n) => request.extend_from_slice(&buf[..n]),
                            }
                        }
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
