//! Request logging middleware.
//!
//! Emits one `tracing` event per request once the response is produced.
//! Header values are printed only for names in the [`LoggingPolicy`]
//! allow-lists; every other header is listed with a `[Redacted]` value.

use std::fmt::Write as _;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request, Response};
use tower::{Layer, Service};
use tracing::info;

use super::overrides::ResolvedConnection;
use crate::logging::{LoggingPolicy, REDACTED};

/// Layer logging requests under a [`LoggingPolicy`].
#[derive(Clone)]
pub struct HttpLoggingLayer {
    policy: Arc<LoggingPolicy>,
}

impl HttpLoggingLayer {
    pub fn new(policy: Arc<LoggingPolicy>) -> Self {
        Self { policy }
    }
}

impl<S> Layer<S> for HttpLoggingLayer {
    type Service = HttpLoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpLoggingService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

#[derive(Clone)]
pub struct HttpLoggingService<S> {
    inner: S,
    policy: Arc<LoggingPolicy>,
}

impl<S> Service<Request<Body>> for HttpLoggingService<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let remote = req
            .extensions()
            .get::<ResolvedConnection>()
            .and_then(|c| c.remote)
            .map(|r| r.to_string())
            .unwrap_or_default();
        let policy = Arc::clone(&self.policy);
        let request_headers = req.headers().clone();

        let mut inner = self.inner.clone();

        Box::pin(async move {
            let response = inner.call(req).await?;

            let (request_allowed, response_allowed) =
                policy.filter(&request_headers, response.headers());
            let request_headers = format_headers(&request_headers, &request_allowed);
            let response_headers = format_headers(response.headers(), &response_allowed);

            info!(
                method = %method,
                path = %path,
                remote = %remote,
                status = response.status().as_u16(),
                latency_ms = started.elapsed().as_millis() as u64,
                request_headers = %request_headers,
                response_headers = %response_headers,
                "HTTP request"
            );

            Ok(response)
        })
    }
}

/// `name: value` pairs, redacting values whose name is not in `allowed`.
pub fn format_headers(headers: &HeaderMap, allowed: &[HeaderName]) -> String {
    let mut out = String::new();
    for (name, value) in headers {
        if !out.is_empty() {
            out.push_str(", ");
        }
        let value = if allowed.contains(name) {
            value.to_str().unwrap_or(REDACTED)
        } else {
            REDACTED
        };
        let _ = write!(out, "{name}: {value}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::get;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_format_headers_redacts() {
        let policy = LoggingPolicy::default();
        let mut headers = HeaderMap::new();
        headers.insert("user-agent", "curl/8".parse().unwrap());
        headers.insert("authorization", "Bearer secret".parse().unwrap());

        let (allowed, _) = policy.filter(&headers, &HeaderMap::new());
        let formatted = format_headers(&headers, &allowed);

        assert!(formatted.contains("user-agent: curl/8"));
        assert!(formatted.contains("authorization: [Redacted]"));
        assert!(!formatted.contains("secret"));
    }

    #[test]
    fn test_format_headers_response_side() {
        let policy = LoggingPolicy::default();
        let mut response = HeaderMap::new();
        response.insert("content-type", "text/plain".parse().unwrap());
        response.insert("set-cookie", "session=abc".parse().unwrap());

        let (request_allowed, response_allowed) = policy.filter(&HeaderMap::new(), &response);
        let formatted = format_headers(&response, &response_allowed);

        assert!(request_allowed.is_empty());
        assert!(formatted.contains("content-type: text/plain"));
        assert!(formatted.contains("set-cookie: [Redacted]"));
    }

    #[test]
    fn test_format_headers_empty() {
        assert_eq!(format_headers(&HeaderMap::new(), &[]), "");
    }

    #[tokio::test]
    async fn test_layer_passes_response_through() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(HttpLoggingLayer::new(Arc::new(LoggingPolicy::default())));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
