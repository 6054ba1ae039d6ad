//! # HTTP Overrides
//!
//! Trusted forwarded-header resolution for Axum services running behind one
//! or more reverse proxies, together with the health probe routing and
//! request logging policy such deployments need:
//!
//! - **Forwarded headers**: `X-Forwarded-For/Host/Proto` honored only from
//!   known proxies and networks, up to a hop limit
//! - **Health probes**: configured paths answered with a plaintext status
//!   before any other handling
//! - **Request logging**: header allow-lists with everything else redacted
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Config (env / .env)                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HttpOverrides::register → Registration (Arc, read-only)    │
//! │    TrustConfig · HealthProbeMatcher · LoggingPolicy         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layers (HttpOverrides → HttpLogging)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers                                                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use http_overrides::{Config, ConnectionInfo, HttpOverrides, build_router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     let mut overrides = HttpOverrides::new();
//!     overrides.register(&config);
//!     let app = build_router(&overrides)?;
//!
//!     let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<ConnectionInfo>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Trusting a Proxy
//!
//! ```bash
//! HttpOverrides__ForwardedHeaders=XForwardedFor,XForwardedProto \
//! HttpOverrides__KnownNetworks=10.0.0.0/8 cargo run
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod overrides;
pub mod registration;
pub mod routes;
pub mod validation;

// Re-exports for convenience
pub use config::{Config, Settings};
pub use error::{AppError, AppResult};
pub use health::{HealthCheck, HealthStatus};
pub use middleware::{ConnectionInfo, ResolvedConnection};
pub use overrides::{RequestContext, TrustConfig};
pub use registration::{Activation, HttpOverrides, Registration};
pub use routes::build_router;
