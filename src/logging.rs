//! Header allow-lists for request logging.
//!
//! Only header *names* are decided here. The logging layer prints the value
//! of an allowed header and `[Redacted]` for every other one.

use std::collections::HashSet;

use axum::http::{HeaderMap, HeaderName};
use tracing::{info, warn};

use crate::config::HttpLoggingOptions;
use crate::overrides::trust::split_tokens;

/// Request headers logged unless `ClearRequestHeaders` is set.
pub const DEFAULT_REQUEST_HEADERS: &[&str] = &[
    "accept",
    "accept-charset",
    "accept-encoding",
    "accept-language",
    "allow",
    "cache-control",
    "connection",
    "content-encoding",
    "content-length",
    "content-type",
    "date",
    "dnt",
    "expect",
    "host",
    "max-forwards",
    "range",
    "sec-websocket-extensions",
    "sec-websocket-version",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "user-agent",
    "warning",
    "x-requested-with",
    "x-ua-compatible",
];

/// Response headers logged unless `ClearResponseHeaders` is set.
pub const DEFAULT_RESPONSE_HEADERS: &[&str] = &[
    "accept-ranges",
    "age",
    "allow",
    "alt-svc",
    "connection",
    "content-disposition",
    "content-language",
    "content-length",
    "content-location",
    "content-range",
    "content-type",
    "date",
    "expires",
    "last-modified",
    "location",
    "server",
    "transfer-encoding",
    "upgrade",
    "x-powered-by",
];

/// Placeholder logged instead of a header value outside the allow-list.
pub const REDACTED: &str = "[Redacted]";

/// Which header names may be logged with their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingPolicy {
    enabled: bool,
    request_headers: HashSet<HeaderName>,
    response_headers: HashSet<HeaderName>,
    media_types: Vec<String>,
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            request_headers: static_names(DEFAULT_REQUEST_HEADERS),
            response_headers: static_names(DEFAULT_RESPONSE_HEADERS),
            media_types: Vec::new(),
        }
    }
}

impl LoggingPolicy {
    pub fn from_options(options: &HttpLoggingOptions) -> Self {
        let mut policy = Self {
            enabled: options.enabled,
            ..Self::default()
        };

        if options.clear_request_headers {
            policy.request_headers.clear();
        }
        if options.clear_response_headers {
            policy.response_headers.clear();
        }

        policy
            .request_headers
            .extend(parse_names(options.request_headers.as_deref(), "RequestHeaders"));
        policy
            .response_headers
            .extend(parse_names(options.response_headers.as_deref(), "ResponseHeaders"));

        policy.media_types = options
            .media_type_options
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        policy
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn media_types(&self) -> &[String] {
        &self.media_types
    }

    pub fn is_request_header_allowed(&self, name: &HeaderName) -> bool {
        self.request_headers.contains(name)
    }

    pub fn is_response_header_allowed(&self, name: &HeaderName) -> bool {
        self.response_headers.contains(name)
    }

    /// Names present in each map that may be logged with their value.
    pub fn filter(
        &self,
        request_headers: &HeaderMap,
        response_headers: &HeaderMap,
    ) -> (Vec<HeaderName>, Vec<HeaderName>) {
        let request = request_headers
            .keys()
            .filter(|name| self.is_request_header_allowed(name))
            .cloned()
            .collect();
        let response = response_headers
            .keys()
            .filter(|name| self.is_response_header_allowed(name))
            .cloned()
            .collect();
        (request, response)
    }

    /// Allowed request header names, sorted.
    pub fn request_headers(&self) -> Vec<&str> {
        sorted(&self.request_headers)
    }

    /// Allowed response header names, sorted.
    pub fn response_headers(&self) -> Vec<&str> {
        sorted(&self.response_headers)
    }

    pub fn log_summary(&self) {
        if !self.enabled {
            return;
        }
        info!(
            request_headers = %self.request_headers().join(","),
            response_headers = %self.response_headers().join(","),
            media_types = %self.media_types.join(","),
            "Use HttpLogging"
        );
    }
}

fn static_names(names: &[&'static str]) -> HashSet<HeaderName> {
    names.iter().copied().map(HeaderName::from_static).collect()
}

fn parse_names(value: Option<&str>, key: &str) -> Vec<HeaderName> {
    split_tokens(value.unwrap_or_default())
        .into_iter()
        .filter_map(|token| match HeaderName::from_bytes(token.as_bytes()) {
            Ok(name) => Some(name),
            Err(_) => {
                warn!(key = %key, header = %token, "Invalid header name, skipping");
                None
            }
        })
        .collect()
}

fn sorted(names: &HashSet<HeaderName>) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(HeaderName::as_str).collect();
    names.sort_unstable();
    names
}
