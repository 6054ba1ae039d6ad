//! Forwarded header trust evaluation.
//!
//! ```text
//! HttpOverridesOptions ──build──► TrustConfig (Arc, read-only)
//!                                      │
//! RequestContext ──► ForwardedHeaderResolver::resolve ──► Resolution
//! ```

pub mod context;
pub mod hosts;
pub mod network;
pub mod resolver;
pub mod trust;

pub use context::RequestContext;
pub use hosts::{AllowedHosts, HostPattern};
pub use network::IpNetwork;
pub use resolver::{ForwardedHeaderResolver, Outcome, Resolution};
pub use trust::{ForwardedHeaderKinds, HeaderNames, TrustConfig};
