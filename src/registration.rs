//! Startup registration and per-request activation.
//!
//! # Lifecycle
//!
//! ```text
//! startup:      HttpOverrides::register(&Config) ──► Arc<Registration>
//!                                                     (logs effective policy)
//! per request:  Registration::activate(&mut RequestContext)
//!                   ├─ health probe?   ──► Activation::HealthProbe
//!                   ├─ resolve chain
//!                   └─ host filtered?  ──► Activation::RejectHost
//!                                     else Activation::Continue
//! ```
//!
//! Layers can only be built from a registered instance; asking for them
//! earlier is `AppError::NotRegistered`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Response;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::health::{
    HealthCheck, HealthChecks, HealthProbeConfig, HealthProbeMatcher, HealthResponseWriter,
    HealthStatus,
};
use crate::logging::LoggingPolicy;
use crate::middleware::{HttpLoggingLayer, HttpOverridesLayer};
use crate::overrides::{ForwardedHeaderResolver, RequestContext, Resolution, TrustConfig};

/// What the pipeline should do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Answer with the health responder, skipping everything else
    HealthProbe(HealthStatus),
    /// Continue with normal handling
    Continue(Resolution),
    /// Host filtering is on and the forwarded host is not allowed
    RejectHost(String),
}

/// Health probe route: matcher plus responder.
#[derive(Debug, Clone)]
struct ProbeRoute {
    matcher: HealthProbeMatcher,
    writer: HealthResponseWriter,
}

/// Policy objects built once at startup and shared read-only afterwards.
#[derive(Debug)]
pub struct Registration {
    resolver: ForwardedHeaderResolver,
    probe: Option<ProbeRoute>,
    health_checks: HealthChecks,
    logging: Arc<LoggingPolicy>,
    host_filtering: bool,
}

impl Registration {
    /// Build every policy object from the configuration.
    pub fn build(config: &Config, health_checks: HealthChecks) -> Self {
        let trust = TrustConfig::build(&config.http_overrides, config.forwarded_headers_enabled);

        let probe_config = HealthProbeConfig::from_options(&config.health_check);
        let probe = probe_config.enabled.then(|| ProbeRoute {
            matcher: HealthProbeMatcher::new(&probe_config),
            writer: HealthResponseWriter::new(&probe_config.prefix, &probe_config.suffix),
        });

        Self {
            resolver: ForwardedHeaderResolver::new(Arc::new(trust)),
            probe,
            health_checks,
            logging: Arc::new(LoggingPolicy::from_options(&config.http_logging)),
            host_filtering: config.host_filtering,
        }
    }

    pub fn trust(&self) -> &TrustConfig {
        self.resolver.config()
    }

    pub fn logging_policy(&self) -> &Arc<LoggingPolicy> {
        &self.logging
    }

    pub fn health_probe(&self) -> Option<&HealthProbeMatcher> {
        self.probe.as_ref().map(|p| &p.matcher)
    }

    pub fn host_filtering(&self) -> bool {
        self.host_filtering
    }

    /// Run the per-request hooks: health probe first, then resolution.
    pub fn activate(&self, ctx: &mut RequestContext) -> Activation {
        if let Some(probe) = &self.probe
            && probe.matcher.matches(&ctx.path, ctx.local_port)
        {
            return Activation::HealthProbe(self.health_checks.status());
        }

        let resolution = self.resolver.resolve(ctx);

        if self.host_filtering
            && let Some(host) = &resolution.host_rejected
        {
            return Activation::RejectHost(host.clone());
        }

        Activation::Continue(resolution)
    }

    /// Plaintext health response for `status`.
    pub fn health_response(&self, status: HealthStatus) -> Response<Body> {
        match &self.probe {
            Some(probe) => probe.writer.write(status),
            None => HealthResponseWriter::default().write(status),
        }
    }

    /// Log the effective configuration.
    pub fn log_summary(&self) {
        self.trust().log_summary();

        match &self.probe {
            Some(probe) => info!(
                paths = %probe.matcher.paths().join(","),
                port = ?probe.matcher.port(),
                checks = self.health_checks.len(),
                "Use HealthChecks"
            ),
            None => debug!("Health checks disabled"),
        }

        if self.host_filtering {
            info!(allowed_hosts = %self.trust().allowed_hosts(), "HostFiltering enabled");
        }

        self.logging.log_summary();
    }
}

/// Entry point for wiring forwarded headers, health probes and request
/// logging into an axum application.
///
/// # Example
///
/// ```rust,ignore
/// let mut overrides = HttpOverrides::new();
/// overrides.register(&config);
/// let app = overrides.apply(Router::new().route("/", get(handler)))?;
/// ```
#[derive(Debug, Default)]
pub struct HttpOverrides {
    health_checks: HealthChecks,
    registration: Option<Arc<Registration>>,
}

impl HttpOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check contributing to the health probe status.
    pub fn with_health_check(mut self, check: Arc<dyn HealthCheck>) -> Self {
        self.health_checks.register(check);
        self
    }

    /// Build the policy objects once and log the effective configuration.
    pub fn register(&mut self, config: &Config) -> Arc<Registration> {
        let registration = Arc::new(Registration::build(config, self.health_checks.clone()));
        registration.log_summary();
        self.registration = Some(Arc::clone(&registration));
        registration
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    /// The registration built by [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotRegistered` if `register` has not been called.
    pub fn registration(&self) -> AppResult<Arc<Registration>> {
        self.registration.clone().ok_or(AppError::NotRegistered)
    }

    /// Wrap `router` with the overrides layer (and the logging layer when
    /// request logging is enabled).
    ///
    /// The overrides layer is outermost, so health probes skip request
    /// logging and logged requests show the resolved connection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotRegistered` if `register` has not been called.
    pub fn apply(&self, router: Router) -> AppResult<Router> {
        let registration = self.registration()?;

        let router = if registration.logging_policy().enabled() {
            router.layer(HttpLoggingLayer::new(Arc::clone(registration.logging_policy())))
        } else {
            router
        };

        Ok(router.layer(HttpOverridesLayer::new(registration)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::net::IpAddr;

    use super::*;
    use crate::config::{HealthCheckOptions, HttpOverridesOptions};
    use crate::overrides::Outcome;

    fn config() -> Config {
        Config {
            http_overrides: HttpOverridesOptions {
                forwarded_headers: Some("XForwardedFor,XForwardedHost".to_string()),
                known_proxies: Some("10.0.0.1".to_string()),
                allowed_hosts: vec!["*.example.com".to_string()],
                ..Default::default()
            },
            ..Config::default()
        }
    }

    fn ctx(path: &str) -> RequestContext {
        RequestContext::new(Some("10.0.0.1:5000".parse().unwrap()), 3000, path)
    }

    struct Failing;

    impl HealthCheck for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn check(&self) -> HealthStatus {
            HealthStatus::Unhealthy
        }
    }

    #[test]
    fn test_apply_before_register_is_error() {
        let overrides = HttpOverrides::new();

        assert!(!overrides.is_registered());
        assert!(matches!(
            overrides.apply(Router::new()),
            Err(AppError::NotRegistered)
        ));
        assert!(matches!(
            overrides.registration(),
            Err(AppError::NotRegistered)
        ));
    }

    #[test]
    fn test_register_then_apply() {
        let mut overrides = HttpOverrides::new();
        overrides.register(&config());

        assert!(overrides.is_registered());
        assert!(overrides.apply(Router::new()).is_ok());
    }

    #[test]
    fn test_health_probe_runs_first() {
        let registration = Registration::build(&config(), HealthChecks::new());
        let mut c = ctx("/healthz").with_header("x-forwarded-for", "203.0.113.5");
        let before = c.clone();

        assert_eq!(
            registration.activate(&mut c),
            Activation::HealthProbe(HealthStatus::Healthy)
        );
        assert_eq!(c, before);
    }

    #[test]
    fn test_health_status_from_checks() {
        let mut overrides = HttpOverrides::new().with_health_check(Arc::new(Failing));
        let registration = overrides.register(&config());

        assert_eq!(
            registration.activate(&mut ctx("/healthz")),
            Activation::HealthProbe(HealthStatus::Unhealthy)
        );
    }

    #[test]
    fn test_disabled_health_check_falls_through() {
        let config = Config {
            health_check: HealthCheckOptions {
                enabled: false,
                ..Default::default()
            },
            ..config()
        };
        let registration = Registration::build(&config, HealthChecks::new());

        assert!(registration.health_probe().is_none());
        assert!(matches!(
            registration.activate(&mut ctx("/healthz")),
            Activation::Continue(_)
        ));
    }

    #[test]
    fn test_continue_with_resolution() {
        let registration = Registration::build(&config(), HealthChecks::new());
        let mut c = ctx("/e/x").with_header("x-forwarded-for", "203.0.113.5");

        let Activation::Continue(resolution) = registration.activate(&mut c) else {
            panic!("expected Continue");
        };

        assert_eq!(resolution.outcome, Outcome::Applied);
        assert_eq!(c.remote_addr, Some("203.0.113.5".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn test_disallowed_host_without_filtering_continues() {
        let registration = Registration::build(&config(), HealthChecks::new());
        let mut c = ctx("/").with_header("x-forwarded-host", "evil.test");

        let Activation::Continue(resolution) = registration.activate(&mut c) else {
            panic!("expected Continue");
        };
        assert_eq!(resolution.host_rejected.as_deref(), Some("evil.test"));
    }

    #[test]
    fn test_disallowed_host_with_filtering_rejects() {
        let config = Config {
            host_filtering: true,
            ..config()
        };
        let registration = Registration::build(&config, HealthChecks::new());
        let mut c = ctx("/").with_header("x-forwarded-host", "evil.test");

        assert_eq!(
            registration.activate(&mut c),
            Activation::RejectHost("evil.test".to_string())
        );
    }

    #[test]
    fn test_bypass_from_config() {
        let config = Config {
            forwarded_headers_enabled: true,
            ..config()
        };
        let registration = Registration::build(&config, HealthChecks::new());
        let mut c = ctx("/").with_header("x-forwarded-for", "203.0.113.5");
        let before = c.clone();

        registration.activate(&mut c);

        assert!(registration.trust().bypass_all());
        assert_eq!(c, before);
    }
}
