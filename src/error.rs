use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
///
/// # Startup vs. Request Errors
///
/// Most variants only surface while the service is being wired together
/// and are turned into process exit codes by `main`:
///
/// - `ConfigError` - A server setting could not be parsed
/// - `NotRegistered` - The per-request hooks were requested before
///   [`HttpOverrides::register`](crate::HttpOverrides::register) ran
/// - `MetricsError` - The Prometheus exporter could not be installed
///
/// `HostNotAllowed` is the only variant produced while serving traffic.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("HttpOverrides must be registered before the pipeline is activated")]
    NotRegistered,

    #[error("Forwarded host is not allowed: {0}")]
    HostNotAllowed(String),

    #[error("Metrics exporter error: {0}")]
    MetricsError(String),
}

/// Error response body for API endpoints.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::HostNotAllowed(host) => {
                tracing::warn!(host = %host, "Rejecting request with disallowed forwarded host");
                (
                    StatusCode::BAD_REQUEST,
                    "host_not_allowed",
                    "The requested host is not allowed.",
                )
            }
            other => {
                // Full details stay in the server log
                tracing::error!(error = %other, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred. Please contact support if the issue persists.",
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message: message.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
