//! Health probe routing and the minimal plaintext responder.
//!
//! # Probe Paths
//!
//! - `HealthCheck:Paths:n` when any are configured
//! - otherwise `/healthz` and `/robots933456.txt` when
//!   `HealthCheck:IsAzureAppServiceContainer` is true
//! - otherwise `HealthCheck:Path` (default `/healthz`)
//!
//! A request is a probe when its local port matches `HealthCheck:Port` (if
//! set) and its path equals one of the probe paths exactly, ignoring ASCII
//! case. `/healthz/extra` and `/health` are not probes, and a configured
//! `/healthz/` does not answer `/healthz`.
//!
//! # Status
//!
//! Registered [`HealthCheck`]s aggregate to the worst status. With none
//! registered the service is `Healthy`. `Unhealthy` answers 503, the other
//! statuses 200.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use tracing::{debug, warn};

use crate::config::HealthCheckOptions;
use crate::validation::is_valid_probe_path;

/// Default probe path.
pub const DEFAULT_HEALTH_PATH: &str = "/healthz";

/// Warm-up path probed by Azure App Service containers.
pub const AZURE_APP_SERVICE_PATH: &str = "/robots933456.txt";

// =============================================================================
// Status and Checks
// =============================================================================

/// Health of the service, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Degraded => "Degraded",
            Self::Unhealthy => "Unhealthy",
        }
    }

    pub fn status_code(self) -> StatusCode {
        match self {
            Self::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
            Self::Healthy | Self::Degraded => StatusCode::OK,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named check contributing to the probe status.
///
/// Checks run on the request path, so they should report cached state rather
/// than perform I/O.
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self) -> HealthStatus;
}

/// Registered checks, evaluated on every probe.
#[derive(Clone, Default)]
pub struct HealthChecks {
    checks: Vec<Arc<dyn HealthCheck>>,
}

impl HealthChecks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: Arc<dyn HealthCheck>) {
        self.checks.push(check);
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Worst status of all checks.
    pub fn status(&self) -> HealthStatus {
        self.checks
            .iter()
            .map(|c| {
                let status = c.check();
                if status != HealthStatus::Healthy {
                    warn!(check = %c.name(), status = %status, "Health check not healthy");
                }
                status
            })
            .max()
            .unwrap_or(HealthStatus::Healthy)
    }
}

impl fmt::Debug for HealthChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|c| c.name()))
            .finish()
    }
}

// =============================================================================
// Probe Matching
// =============================================================================

/// Probe settings resolved from [`HealthCheckOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthProbeConfig {
    pub enabled: bool,
    pub paths: Vec<String>,
    pub port: Option<u16>,
    pub prefix: String,
    pub suffix: String,
}

impl HealthProbeConfig {
    pub fn from_options(options: &HealthCheckOptions) -> Self {
        let configured: Vec<String> = if !options.paths.is_empty() {
            options.paths.clone()
        } else if options.is_azure_app_service_container {
            vec![
                DEFAULT_HEALTH_PATH.to_string(),
                AZURE_APP_SERVICE_PATH.to_string(),
            ]
        } else {
            match options.path.as_deref().map(str::trim) {
                Some(path) if !path.is_empty() => vec![path.to_string()],
                _ => vec![DEFAULT_HEALTH_PATH.to_string()],
            }
        };

        let mut paths: Vec<String> = Vec::with_capacity(configured.len());
        for path in configured {
            let path = path.trim();
            if !is_valid_probe_path(path) {
                warn!(path = %path, "Invalid health check path, skipping");
            } else if !paths.iter().any(|p| p.eq_ignore_ascii_case(path)) {
                paths.push(path.to_string());
            }
        }

        Self {
            enabled: options.enabled && !paths.is_empty(),
            paths,
            port: options.port,
            prefix: options.prefix.clone().unwrap_or_default(),
            suffix: options.suffix.clone().unwrap_or_default(),
        }
    }
}

/// Decides whether a request goes to the health responder.
#[derive(Debug, Clone)]
pub struct HealthProbeMatcher {
    paths: Vec<String>,
    port: Option<u16>,
}

impl HealthProbeMatcher {
    pub fn new(config: &HealthProbeConfig) -> Self {
        Self {
            paths: config.paths.clone(),
            port: config.port,
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn matches(&self, path: &str, local_port: u16) -> bool {
        if self.port.is_some_and(|port| port != local_port) {
            return false;
        }
        self.paths.iter().any(|probe| is_same_path(path, probe))
    }
}

/// Exact equality ignoring ASCII case; an empty request path is the root.
fn is_same_path(path: &str, probe: &str) -> bool {
    if probe == "/" {
        return path == "/" || path.is_empty();
    }
    path.eq_ignore_ascii_case(probe)
}

// =============================================================================
// Responder
// =============================================================================

/// Minimal plaintext responder: `{prefix}{status}{suffix}`.
#[derive(Debug, Clone)]
pub struct HealthResponseWriter {
    healthy: String,
    degraded: String,
    unhealthy: String,
}

impl HealthResponseWriter {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        let build = |status: HealthStatus| format!("{prefix}{status}{suffix}");
        Self {
            healthy: build(HealthStatus::Healthy),
            degraded: build(HealthStatus::Degraded),
            unhealthy: build(HealthStatus::Unhealthy),
        }
    }

    pub fn body(&self, status: HealthStatus) -> &str {
        match status {
            HealthStatus::Healthy => &self.healthy,
            HealthStatus::Degraded => &self.degraded,
            HealthStatus::Unhealthy => &self.unhealthy,
        }
    }

    pub fn write(&self, status: HealthStatus) -> Response<Body> {
        debug!(status = %status, "Answering health probe");
        let mut response = Response::new(Body::from(self.body(status).to_string()));
        *response.status_mut() = status.status_code();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain"),
        );
        response
    }
}

impl Default for HealthResponseWriter {
    fn default() -> Self {
        Self::new("", "")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn matcher(options: HealthCheckOptions) -> HealthProbeMatcher {
        HealthProbeMatcher::new(&HealthProbeConfig::from_options(&options))
    }

    struct Fixed(&'static str, HealthStatus);

    impl HealthCheck for Fixed {
        fn name(&self) -> &str {
            self.0
        }

        fn check(&self) -> HealthStatus {
            self.1
        }
    }

    #[test]
    fn test_default_path_any_port() {
        let m = matcher(HealthCheckOptions::default());

        assert!(m.matches("/healthz", 80));
        assert!(m.matches("/healthz", 8080));
        assert!(m.matches("/HealthZ", 80));
        assert!(!m.matches("/healthz/extra", 80));
        assert!(!m.matches("/health", 80));
        assert!(!m.matches("/healthzz", 80));
        assert!(!m.matches("/", 80));
    }

    #[test]
    fn test_trailing_slash_path_is_exact() {
        let m = matcher(HealthCheckOptions {
            path: Some("/healthz/".to_string()),
            ..Default::default()
        });

        assert_eq!(m.paths(), &["/healthz/"]);
        assert!(m.matches("/healthz/", 80));
        assert!(m.matches("/HEALTHZ/", 80));
        assert!(!m.matches("/healthz", 80));
    }

    #[test]
    fn test_root_path() {
        let m = matcher(HealthCheckOptions {
            path: Some("/".to_string()),
            ..Default::default()
        });

        assert!(m.matches("/", 80));
        assert!(!m.matches("/healthz", 80));
    }

    #[test]
    fn test_port_restriction() {
        let m = matcher(HealthCheckOptions {
            port: Some(8081),
            ..Default::default()
        });

        assert!(m.matches("/healthz", 8081));
        assert!(!m.matches("/healthz", 8080));
    }

    #[test]
    fn test_paths_take_precedence() {
        let m = matcher(HealthCheckOptions {
            path: Some("/ignored".to_string()),
            paths: vec!["/live".to_string(), "/ready".to_string()],
            is_azure_app_service_container: true,
            ..Default::default()
        });

        assert_eq!(m.paths(), &["/live", "/ready"]);
        assert!(m.matches("/ready", 1));
        assert!(!m.matches("/ignored", 1));
        assert!(!m.matches("/healthz", 1));
    }

    #[test]
    fn test_azure_paths() {
        let m = matcher(HealthCheckOptions {
            is_azure_app_service_container: true,
            ..Default::default()
        });

        assert!(m.matches("/healthz", 1));
        assert!(m.matches("/robots933456.txt", 1));
    }

    #[test]
    fn test_single_path() {
        let m = matcher(HealthCheckOptions {
            path: Some("/status".to_string()),
            ..Default::default()
        });

        assert!(m.matches("/status", 1));
        assert!(!m.matches("/healthz", 1));
    }

    #[test]
    fn test_invalid_paths_are_skipped() {
        let config = HealthProbeConfig::from_options(&HealthCheckOptions {
            paths: vec!["live".to_string(), "/ok".to_string(), "/OK".to_string()],
            ..Default::default()
        });

        assert_eq!(config.paths, vec!["/ok"]);
        assert!(config.enabled);
    }

    #[test]
    fn test_no_valid_path_disables_probe() {
        let config = HealthProbeConfig::from_options(&HealthCheckOptions {
            paths: vec!["nope".to_string()],
            ..Default::default()
        });

        assert!(!config.enabled);
    }

    #[test]
    fn test_disabled_flag_carried() {
        let config = HealthProbeConfig::from_options(&HealthCheckOptions {
            enabled: false,
            ..Default::default()
        });
        assert!(!config.enabled);
    }

    #[test]
    fn test_status_aggregates_worst() {
        let mut checks = HealthChecks::new();
        assert_eq!(checks.status(), HealthStatus::Healthy);

        checks.register(Arc::new(Fixed("a", HealthStatus::Healthy)));
        checks.register(Arc::new(Fixed("b", HealthStatus::Degraded)));
        assert_eq!(checks.status(), HealthStatus::Degraded);

        checks.register(Arc::new(Fixed("c", HealthStatus::Unhealthy)));
        assert_eq!(checks.status(), HealthStatus::Unhealthy);
        assert_eq!(checks.len(), 3);
    }

    #[test]
    fn test_writer_bodies() {
        let writer = HealthResponseWriter::new("[", "]");

        assert_eq!(writer.body(HealthStatus::Healthy), "[Healthy]");
        assert_eq!(writer.body(HealthStatus::Degraded), "[Degraded]");
        assert_eq!(writer.body(HealthStatus::Unhealthy), "[Unhealthy]");
    }

    #[tokio::test]
    async fn test_writer_response() {
        let response = HealthResponseWriter::default().write(HealthStatus::Unhealthy);

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Unhealthy");
    }
}
