//! HTTP middleware built from a [`Registration`](crate::registration::Registration).
//!
//! # Architecture
//!
//! ```text
//! Request → HttpOverrides → HttpLogging → Handler → Response
//!              ↓      ↓
//!       health probe  400 host_not_allowed (host filtering)
//! ```
//!
//! - **HttpOverrides**: Health probe predicate, then forwarded header resolution
//! - **HttpLogging**: One structured event per request with redacted headers

pub mod http_logging;
pub mod overrides;

pub use http_logging::HttpLoggingLayer;
pub use overrides::{ConnectionInfo, HttpOverridesLayer, ResolvedConnection};
