//! Per-request view of the connection as the application perceives it.

use std::net::{IpAddr, SocketAddr};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Connection and request facts the resolver reads and rewrites.
///
/// Built by the pipeline for each request and owned by it for the request's
/// duration. Only the fields of enabled header kinds are ever changed, plus
/// the forwarded/original header entries themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Immediate peer address; `None` when the transport did not report one
    pub remote_addr: Option<IpAddr>,
    /// Immediate peer port (0 when unknown)
    pub remote_port: u16,
    /// Local port the request arrived on
    pub local_port: u16,
    /// Declared scheme, e.g. `http`
    pub scheme: String,
    /// Declared host (`Host` header or URI authority)
    pub host: Option<String>,
    /// Request path without the query string
    pub path: String,
    /// Raw request headers
    pub headers: HeaderMap,
}

impl RequestContext {
    pub fn new(remote: Option<SocketAddr>, local_port: u16, path: impl Into<String>) -> Self {
        Self {
            remote_addr: remote.map(|addr| addr.ip()),
            remote_port: remote.map_or(0, |addr| addr.port()),
            local_port,
            scheme: "http".to_string(),
            host: None,
            path: path.into(),
            headers: HeaderMap::new(),
        }
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Append a header value; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Remote address and port as a socket address, if known.
    pub fn remote_socket(&self) -> Option<SocketAddr> {
        self.remote_addr
            .map(|ip| SocketAddr::new(ip, self.remote_port))
    }
}
