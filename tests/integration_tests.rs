//! Integration tests against a real server on an ephemeral port.
//!
//! Each test binds its own listener on `127.0.0.1:0`, so the client always
//! connects from loopback. Whether loopback is a trusted proxy depends on the
//! settings the test passes in.
//!
//! Run with: `cargo test --test integration_tests`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use http_overrides::models::EchoResponse;
use http_overrides::{Config, ConnectionInfo, HttpOverrides, Settings, build_router};
use reqwest::{Client, StatusCode};
use tokio::net::TcpListener;

/// Running server plus a client pointed at it.
struct TestServer {
    base_url: String,
    client: Client,
}

impl TestServer {
    /// Start the sample application with the given settings.
    async fn start(pairs: &[(&str, &str)]) -> Self {
        let settings = Settings::from_pairs(pairs.iter().map(|(k, v)| (*k, *v)));
        let config = Config::from_settings(&settings).expect("Invalid test configuration");

        let mut overrides = HttpOverrides::new();
        overrides.register(&config);
        let app = build_router(&overrides).expect("Failed to build router");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to ephemeral port");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<ConnectionInfo>(),
            )
            .await
            .expect("Server failed");
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn echo(&self, headers: &[(&str, &str)]) -> EchoResponse {
        let mut request = self.client.get(self.url("/e/check"));
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await.expect("Echo request failed");
        assert_eq!(response.status(), StatusCode::OK);
        response.json().await.expect("Failed to parse echo response")
    }
}

// ============================================================================
// Health Probe Tests
// ============================================================================

#[tokio::test]
async fn test_default_health_probe() {
    let server = TestServer::start(&[]).await;

    let response = server
        .client
        .get(server.url("/healthz"))
        .send()
        .await
        .expect("Health request failed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("text/plain")
    );
    assert_eq!(response.text().await.unwrap(), "Healthy");
}

#[tokio::test]
async fn test_health_probe_is_segment_exact() {
    let server = TestServer::start(&[]).await;

    for path in ["/healthz/extra", "/health"] {
        let response = server.client.get(server.url(path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "path {path}");
    }
}

#[tokio::test]
async fn test_health_probe_custom_paths_and_body() {
    let server = TestServer::start(&[
        ("HealthCheck__Paths__0", "/live"),
        ("HealthCheck__Paths__1", "/ready"),
        ("HealthCheck__Prefix", "status="),
    ])
    .await;

    let response = server.client.get(server.url("/ready")).send().await.unwrap();
    assert_eq!(response.text().await.unwrap(), "status=Healthy");

    let response = server.client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_probe_on_other_port_is_not_answered() {
    // The server listens on an ephemeral port, never on 1
    let server = TestServer::start(&[("HealthCheck__Port", "1")]).await;

    let response = server.client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Forwarded Header Tests
// ============================================================================

#[tokio::test]
async fn test_forwarded_headers_disabled_by_default() {
    let server = TestServer::start(&[]).await;

    let echo = server.echo(&[("x-forwarded-for", "203.0.113.5")]).await;

    assert_eq!(echo.connection.remote_ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(echo.connection.forwarded_hops, 0);
}

#[tokio::test]
async fn test_loopback_proxy_is_trusted() {
    let server = TestServer::start(&[(
        "HttpOverrides__ForwardedHeaders",
        "XForwardedFor,XForwardedProto",
    )])
    .await;

    let echo = server
        .echo(&[
            ("x-forwarded-for", "203.0.113.5"),
            ("x-forwarded-proto", "https"),
        ])
        .await;

    assert_eq!(echo.connection.remote_ip.as_deref(), Some("203.0.113.5"));
    assert_eq!(echo.connection.forwarded_hops, 1);
    assert_eq!(echo.scheme, "https");
    assert!(echo.headers.contains_key("x-original-for"));
    assert_eq!(
        echo.headers.get("x-original-proto").map(String::as_str),
        Some("http")
    );
    assert!(!echo.headers.contains_key("x-forwarded-for"));
}

#[tokio::test]
async fn test_untrusted_peer_is_ignored() {
    let server = TestServer::start(&[
        ("HttpOverrides__ForwardedHeaders", "XForwardedFor"),
        ("HttpOverrides__KnownProxies", "10.0.0.1"),
        ("HttpOverrides__ClearKnownNetworks", "true"),
    ])
    .await;

    let echo = server.echo(&[("x-forwarded-for", "203.0.113.5")]).await;

    assert_eq!(echo.connection.remote_ip.as_deref(), Some("127.0.0.1"));
    assert_eq!(
        echo.headers.get("x-forwarded-for").map(String::as_str),
        Some("203.0.113.5")
    );
}

#[tokio::test]
async fn test_bypass_switch_disables_rewriting() {
    let server = TestServer::start(&[
        ("FORWARDEDHEADERS_ENABLED", "true"),
        ("HttpOverrides__ForwardedHeaders", "All"),
    ])
    .await;

    let echo = server.echo(&[("x-forwarded-for", "203.0.113.5")]).await;

    assert_eq!(echo.connection.remote_ip.as_deref(), Some("127.0.0.1"));
    assert!(!echo.headers.contains_key("x-original-for"));
}

#[tokio::test]
async fn test_forward_limit_unwinds_two_hops() {
    let server = TestServer::start(&[
        ("HttpOverrides__ForwardedHeaders", "XForwardedFor"),
        ("HttpOverrides__ForwardLimit", "2"),
        ("HttpOverrides__KnownNetworks", "127.0.0.0/8;10.0.0.0/8"),
    ])
    .await;

    let echo = server
        .echo(&[("x-forwarded-for", "198.51.100.1, 203.0.113.5, 10.0.0.2")])
        .await;

    assert_eq!(echo.connection.remote_ip.as_deref(), Some("203.0.113.5"));
    assert_eq!(echo.connection.forwarded_hops, 2);
    assert_eq!(
        echo.headers.get("x-forwarded-for").map(String::as_str),
        Some("198.51.100.1")
    );
}

#[tokio::test]
async fn test_forwarded_host_applied() {
    let server = TestServer::start(&[
        ("HttpOverrides__ForwardedHeaders", "XForwardedHost"),
        ("HttpOverrides__AllowedHosts__0", "*.example.com"),
    ])
    .await;

    let echo = server
        .echo(&[("x-forwarded-host", "api.example.com")])
        .await;

    assert_eq!(echo.host.as_deref(), Some("api.example.com"));
    assert_eq!(
        echo.headers.get("host").map(String::as_str),
        Some("api.example.com")
    );
}

#[tokio::test]
async fn test_host_filtering_rejects_disallowed_host() {
    let server = TestServer::start(&[
        ("HttpOverrides__ForwardedHeaders", "XForwardedHost"),
        ("HttpOverrides__AllowedHosts", "*.example.com"),
        ("HostFiltering__Enabled", "true"),
    ])
    .await;

    let response = server
        .client
        .get(server.url("/e/check"))
        .header("x-forwarded-host", "evil.test")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body.get("error").and_then(|v| v.as_str()),
        Some("host_not_allowed")
    );
}

// ============================================================================
// Ambient Behavior
// ============================================================================

#[tokio::test]
async fn test_request_id_propagated() {
    let server = TestServer::start(&[("HttpLogging__Enabled", "true")]).await;

    let response = server
        .client
        .get(server.url("/e/check"))
        .header("x-request-id", "my-correlation-id")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("my-correlation-id")
    );
}

#[tokio::test]
async fn test_echo_reports_query_and_body() {
    let server = TestServer::start(&[]).await;

    let response = server
        .client
        .post(server.url("/e/a/b?x=1"))
        .header("content-type", "text/plain")
        .body("hello")
        .send()
        .await
        .unwrap();
    let echo: EchoResponse = response.json().await.unwrap();

    assert_eq!(echo.url, "a/b");
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.query.get("x").map(String::as_str), Some("1"));
    assert_eq!(echo.body.as_deref(), Some("hello"));
}
