//! End-to-end tests against a served proxy on a real socket.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use discovery_proxy::discovery::Discovery;
use discovery_proxy::{HttpServer, ProxyConfig, Shutdown};

mod common;
use common::{Answer, Reply, StubDiscovery};

async fn serve(config: ProxyConfig, discovery: Arc<dyn Discovery>) -> (SocketAddr, Shutdown, JoinHandle<std::io::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_discovery(config, discovery);
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));
    (addr, shutdown, handle)
}

#[tokio::test]
async fn test_relay_over_the_wire() {
    let backend = common::start_capture_backend(
        Reply::ok(r#"{"id":7}"#).header("content-type", "application/json"),
    )
    .await;
    let (addr, shutdown, handle) = serve(
        common::proxy_config(&["auth-preprod"]),
        StubDiscovery::at(backend.addr),
    )
    .await;

    let client = reqwest::Client::new();
    let response = client
        .get(format!("http://{}/users?id=7", addr))
        .header("Host", "auth-preprod:80")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.text().await.unwrap(), r#"{"id":7}"#);

    let seen = backend.only_request();
    assert_eq!(seen.path, "/users");
    assert_eq!(seen.query.as_deref(), Some("id=7"));

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_forbidden_over_the_wire() {
    let discovery = StubDiscovery::new(Answer::Missing);
    let (addr, shutdown, handle) = serve(common::proxy_config(&["auth-preprod"]), discovery.clone()).await;

    let response = reqwest::Client::new()
        .get(format!("http://{}/", addr))
        .header("Host", "evil.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 403);
    assert_eq!(response.text().await.unwrap(), "Host evil.com is not allowed.");
    assert_eq!(discovery.calls(), 0);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_post_json_over_the_wire() {
    let backend = common::start_capture_backend(Reply::ok("created").status(axum::http::StatusCode::CREATED)).await;
    let (addr, shutdown, handle) = serve(
        common::proxy_config(&["billing"]),
        StubDiscovery::at(backend.addr),
    )
    .await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/invoices", addr))
        .header("Host", "billing")
        .header("content-type", "application/json")
        .body("{ \"amount\": 12.5 }")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(response.text().await.unwrap(), "created");
    assert_eq!(backend.only_request().body, r#"{"amount":12.5}"#);

    shutdown.trigger();
    handle.await.unwrap().unwrap();
}
