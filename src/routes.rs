//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (outermost first)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │  HttpOverrides   │ ← health probes answered here; 400 on disallowed host
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   HttpLogging    │ ← one event per request (when enabled)
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← X-Request-Id generated and propagated
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │     Tracing      │ ← request span
//! └────────┬─────────┘
//!          │
//!          ▼
//!      Handler
//! ```
//!
//! # Routes
//!
//! - `/e/{*url}` - Echo of the resolved request
//! - probe paths (default `/healthz`) - answered by the overrides layer
//!
//! A fallback is registered so that the layers also see requests for paths
//! without a route; probe paths never reach a handler.

use axum::Router;
use axum::http::{HeaderName, StatusCode};
use axum::routing::any;
use tower_http::propagate_header::PropagateHeaderLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppResult;
use crate::handlers;
use crate::registration::HttpOverrides;

/// Header carrying the request ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the application router with all routes and middleware configured.
///
/// # Errors
///
/// Returns `AppError::NotRegistered` if `overrides` was not registered.
pub fn build_router(overrides: &HttpOverrides) -> AppResult<Router> {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let router = Router::new()
        .route("/e/{*url}", any(handlers::echo))
        .fallback(|| async { StatusCode::NOT_FOUND })
        // Applied bottom to top: tracing is innermost
        .layer(TraceLayer::new_for_http())
        .layer(PropagateHeaderLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid));

    overrides.apply(router)
}
