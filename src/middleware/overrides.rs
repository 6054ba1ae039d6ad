//! Forwarded headers and health probe middleware.
//!
//! # Usage
//!
//! Serve the router with [`ConnectionInfo`] so the layer sees both the peer
//! address and the local port:
//!
//! ```rust,ignore
//! axum::serve(
//!     listener,
//!     app.into_make_service_with_connect_info::<ConnectionInfo>(),
//! )
//! .await?;
//! ```
//!
//! Without connection info (e.g. `oneshot` in tests) the peer is unknown and
//! therefore never trusted. A plain `ConnectInfo<SocketAddr>` is honored as
//! well, with local port 0.
//!
//! Handlers read the resolved view through the [`ResolvedConnection`]
//! extension.

use std::net::SocketAddr;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::connect_info::Connected;
use axum::http::{HeaderValue, Request, Response, header};
use axum::response::IntoResponse;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;
use tower::{Layer, Service};
use tracing::debug;

use crate::error::AppError;
use crate::metrics;
use crate::overrides::{ForwardedHeaderKinds, RequestContext, Resolution};
use crate::registration::{Activation, Registration};

/// Peer and local address of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote: SocketAddr,
    pub local: SocketAddr,
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionInfo {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let remote = *stream.remote_addr();
        let local = stream
            .io()
            .local_addr()
            .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], 0)));
        Self { remote, local }
    }
}

/// The connection as the application perceives it after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConnection {
    pub remote: Option<SocketAddr>,
    pub local_port: u16,
    pub scheme: String,
    pub host: Option<String>,
    pub resolution: Resolution,
}

/// Layer running the health probe predicate and the forwarded header
/// resolver ahead of the wrapped service.
#[derive(Clone)]
pub struct HttpOverridesLayer {
    registration: Arc<Registration>,
}

impl HttpOverridesLayer {
    pub fn new(registration: Arc<Registration>) -> Self {
        Self { registration }
    }
}

impl<S> Layer<S> for HttpOverridesLayer {
    type Service = HttpOverridesService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HttpOverridesService {
            inner,
            registration: Arc::clone(&self.registration),
        }
    }
}

#[derive(Clone)]
pub struct HttpOverridesService<S> {
    inner: S,
    registration: Arc<Registration>,
}

impl<S> Service<Request<Body>> for HttpOverridesService<S>
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
        let (mut parts, body) = req.into_parts();
        let mut ctx = request_context(&mut parts);

        match self.registration.activate(&mut ctx) {
            Activation::HealthProbe(status) => {
                metrics::record_health_probe(status.as_str());
                let response = self.registration.health_response(status);
                Box::pin(async move { Ok(response) })
            }
            Activation::RejectHost(host) => {
                metrics::record_host_rejection();
                let response = AppError::HostNotAllowed(host).into_response();
                Box::pin(async move { Ok(response) })
            }
            Activation::Continue(resolution) => {
                metrics::record_forwarded(resolution.outcome.as_str(), resolution.hops);

                let host_applied = resolution.applied.contains(ForwardedHeaderKinds::HOST);
                parts.headers = std::mem::take(&mut ctx.headers);
                if host_applied
                    && let Some(value) = ctx.host.as_deref().and_then(|h| HeaderValue::from_str(h).ok())
                {
                    parts.headers.insert(header::HOST, value);
                }

                if resolution.hops > 0 {
                    debug!(
                        remote = ?ctx.remote_socket(),
                        scheme = %ctx.scheme,
                        host = ?ctx.host,
                        hops = resolution.hops,
                        "Applied forwarded headers"
                    );
                }

                parts.extensions.insert(ResolvedConnection {
                    remote: ctx.remote_socket(),
                    local_port: ctx.local_port,
                    scheme: ctx.scheme,
                    host: ctx.host,
                    resolution,
                });

                let req = Request::from_parts(parts, body);
                let mut inner = self.inner.clone();
                Box::pin(async move { inner.call(req).await })
            }
        }
    }
}

/// Build the context from the request parts, moving the headers into it.
fn request_context(parts: &mut axum::http::request::Parts) -> RequestContext {
    let (remote, local_port) = match parts.extensions.get::<ConnectInfo<ConnectionInfo>>() {
        Some(ConnectInfo(info)) => (Some(info.remote), info.local.port()),
        None => (
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| *addr),
            0,
        ),
    };

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()));

    let mut ctx = RequestContext::new(remote, local_port, parts.uri.path());
    ctx.scheme = parts.uri.scheme_str().unwrap_or("http").to_string();
    ctx.host = host;
    ctx.headers = std::mem::take(&mut parts.headers);
    ctx
}
