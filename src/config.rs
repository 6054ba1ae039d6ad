//! Application configuration loaded from environment variables.
//!
//! # Configuration Hierarchy
//!
//! Configuration is read once at startup into a [`Settings`] snapshot and
//! then bound into the typed [`Config`]. Keys are case-insensitive and use
//! `:` to separate sections; environment variables spell the separator as
//! `__` (for example `HttpOverrides__KnownProxies=10.0.0.1`). A `.env` file
//! is honored when present.
//!
//! # Server
//!
//! - `HOST` / `PORT`: Listen address of the sample service (default `0.0.0.0:3000`)
//! - `METRICS_PORT`: Prometheus endpoint port (default: 0 = disabled)
//! - `RUST_LOG`, `LOG_FORMAT`: Log filter and output format (`text` or `json`)
//!
//! # Sections
//!
//! - `HttpOverrides:*`: Forwarded header trust policy (see [`HttpOverridesOptions`])
//! - `HealthCheck:*`: Health probe paths and responder (see [`HealthCheckOptions`])
//! - `HttpLogging:*`: Request logging allow-lists (see [`HttpLoggingOptions`])
//! - `HostFiltering:Enabled`: Reject requests whose forwarded host is not allowed
//!
//! # Escape Hatch
//!
//! `FORWARDEDHEADERS_ENABLED=true` disables all header rewriting done by this
//! crate, for hosts that already apply forwarded headers themselves. It is read
//! from the root of the settings, never from a section.

use std::collections::BTreeMap;
use std::env;

use crate::error::{AppError, AppResult};

/// Root key of the process-wide bypass switch.
pub const FORWARDED_HEADERS_ENABLED_KEY: &str = "FORWARDEDHEADERS_ENABLED";

/// Default section holding the forwarded header policy.
pub const HTTP_OVERRIDES_SECTION: &str = "HttpOverrides";

/// Default section holding the health probe settings.
pub const HEALTH_CHECK_SECTION: &str = "HealthCheck";

/// Default section holding the request logging settings.
pub const HTTP_LOGGING_SECTION: &str = "HttpLogging";

/// Root key enabling request logging when the logging section name is empty.
pub const HTTP_LOGGING_ENABLED_KEY: &str = "HttpLoggingEnabled";

/// Section holding the host filtering switch.
pub const HOST_FILTERING_SECTION: &str = "HostFiltering";

// =============================================================================
// Raw Settings
// =============================================================================

/// Flat, case-insensitive snapshot of `key -> value` pairs.
///
/// Keys are normalized to lowercase with `:` as the section separator, so
/// `HttpOverrides__KnownProxies` and `httpoverrides:knownproxies` address the
/// same entry.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Snapshot the process environment (after loading `.env` if present).
    pub fn from_env() -> Self {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_pairs(
            env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }

    /// Build a snapshot from explicit pairs (used by tests and embedders).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        Self { values }
    }

    /// Look up a root-level value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    /// View of the keys below `name`. An empty name addresses the root.
    pub fn section(&self, name: &str) -> Section<'_> {
        let prefix = if name.is_empty() {
            String::new()
        } else {
            format!("{}:", normalize_key(name))
        };
        Section {
            settings: self,
            prefix,
        }
    }

    /// Parse a root-level value into the specified type with a default value.
    fn parse_or<T>(&self, name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(name) {
            Some(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            None => Ok(default),
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.replace("__", ":").to_ascii_lowercase()
}

/// A section of [`Settings`]: every lookup is relative to the section prefix.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    settings: &'a Settings,
    prefix: String,
}

impl Section<'_> {
    /// Whether this section addresses the root of the settings.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Raw value of `key` in this section; `Some("")` means configured but empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings
            .values
            .get(&format!("{}{}", self.prefix, normalize_key(key)))
            .map(String::as_str)
    }

    /// `true` only for a case-insensitive `"true"`.
    pub fn is_true(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// `true` only for a case-insensitive `"false"`.
    pub fn is_false(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.trim().eq_ignore_ascii_case("false"))
    }

    /// Values of the indexed children `key:0`, `key:1`, ... in index order.
    pub fn list(&self, key: &str) -> Vec<String> {
        let child_prefix = format!("{}{}:", self.prefix, normalize_key(key));
        let mut items: Vec<(usize, &String)> = self
            .settings
            .values
            .range(child_prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&child_prefix))
            .filter_map(|(k, v)| Some((k.get(child_prefix.len()..)?.parse().ok()?, v)))
            .collect();
        items.sort_by_key(|(index, _)| *index);
        items.into_iter().map(|(_, v)| v.clone()).collect()
    }

    /// Parse an optional value; empty and absent values both yield `None`.
    pub fn parse<T>(&self, key: &str) -> AppResult<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key).map(str::trim) {
            Some(val) if !val.is_empty() => val.parse().map(Some).map_err(|e| {
                AppError::ConfigError(format!("Invalid {}{key}: {e}", self.prefix))
            }),
            _ => Ok(None),
        }
    }
}

// =============================================================================
// Section Options
// =============================================================================

/// Names of the configuration sections, chosen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionNames {
    pub http_overrides: String,
    pub health_check: String,
    pub http_logging: String,
}

impl Default for SectionNames {
    fn default() -> Self {
        Self {
            http_overrides: HTTP_OVERRIDES_SECTION.to_string(),
            health_check: HEALTH_CHECK_SECTION.to_string(),
            http_logging: HTTP_LOGGING_SECTION.to_string(),
        }
    }
}

/// Wire header name overrides, `None` keeps the default name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderNameOverrides {
    pub forwarded_for: Option<String>,
    pub forwarded_host: Option<String>,
    pub forwarded_proto: Option<String>,
    pub original_for: Option<String>,
    pub original_host: Option<String>,
    pub original_proto: Option<String>,
}

/// Raw forwarded header policy as bound from the `HttpOverrides` section.
///
/// List values are kept as configured; token splitting and address parsing
/// happen in [`TrustConfig::build`](crate::overrides::TrustConfig::build) so
/// that a single bad token can be skipped instead of failing startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpOverridesOptions {
    /// `ForwardedHeaders`, e.g. `"XForwardedFor,XForwardedProto"`
    pub forwarded_headers: Option<String>,
    /// `ForwardLimit`; an empty value means unlimited
    pub forward_limit: Option<String>,
    /// `ClearForwardLimit`
    pub clear_forward_limit: bool,
    /// `KnownProxies`
    pub known_proxies: Option<String>,
    /// `ClearKnownProxies`
    pub clear_known_proxies: bool,
    /// `KnownNetworks`
    pub known_networks: Option<String>,
    /// `ClearKnownNetworks`
    pub clear_known_networks: bool,
    /// `AllowedHosts:n` (or a single `;`-separated value)
    pub allowed_hosts: Vec<String>,
    /// `RequireHeaderSymmetry`
    pub require_header_symmetry: bool,
    /// `*HeaderName`
    pub header_names: HeaderNameOverrides,
}

impl HttpOverridesOptions {
    /// Bind the options from a section.
    pub fn from_section(section: &Section<'_>) -> Self {
        let mut allowed_hosts = section.list("AllowedHosts");
        if allowed_hosts.is_empty()
            && let Some(value) = section.get("AllowedHosts")
        {
            allowed_hosts = value
                .split(';')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string)
                .collect();
        }

        let name = |key: &str| section.get(key).map(str::to_string);

        Self {
            forwarded_headers: name("ForwardedHeaders"),
            forward_limit: name("ForwardLimit"),
            clear_forward_limit: section.is_true("ClearForwardLimit"),
            known_proxies: name("KnownProxies"),
            clear_known_proxies: section.is_true("ClearKnownProxies"),
            known_networks: name("KnownNetworks"),
            clear_known_networks: section.is_true("ClearKnownNetworks"),
            allowed_hosts,
            require_header_symmetry: section.is_true("RequireHeaderSymmetry"),
            header_names: HeaderNameOverrides {
                forwarded_for: name("ForwardedForHeaderName"),
                forwarded_host: name("ForwardedHostHeaderName"),
                forwarded_proto: name("ForwardedProtoHeaderName"),
                original_for: name("OriginalForHeaderName"),
                original_host: name("OriginalHostHeaderName"),
                original_proto: name("OriginalProtoHeaderName"),
            },
        }
    }
}

/// Health probe settings bound from the `HealthCheck` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckOptions {
    /// `Enabled` (default: true)
    pub enabled: bool,
    /// `Path` (default: `/healthz`)
    pub path: Option<String>,
    /// `Paths:n`; takes precedence over `Path` when non-empty
    pub paths: Vec<String>,
    /// `Port`; restricts probes to one local port
    pub port: Option<u16>,
    /// `Prefix` prepended to the plaintext body
    pub prefix: Option<String>,
    /// `Suffix` appended to the plaintext body
    pub suffix: Option<String>,
    /// `IsAzureAppServiceContainer`; adds the App Service warm-up path
    pub is_azure_app_service_container: bool,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            paths: Vec::new(),
            port: None,
            prefix: None,
            suffix: None,
            is_azure_app_service_container: false,
        }
    }
}

impl HealthCheckOptions {
    /// Bind the options from a section.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if `Port` is not a valid port number.
    pub fn from_section(section: &Section<'_>) -> AppResult<Self> {
        Ok(Self {
            enabled: !section.is_false("Enabled"),
            path: section.get("Path").map(str::to_string),
            paths: section.list("Paths"),
            port: section.parse("Port")?,
            prefix: section.get("Prefix").map(str::to_string),
            suffix: section.get("Suffix").map(str::to_string),
            is_azure_app_service_container: section.is_true("IsAzureAppServiceContainer"),
        })
    }
}

/// Request logging settings bound from the `HttpLogging` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpLoggingOptions {
    /// `Enabled` (default: false)
    pub enabled: bool,
    /// `ClearRequestHeaders`
    pub clear_request_headers: bool,
    /// `ClearResponseHeaders`
    pub clear_response_headers: bool,
    /// `RequestHeaders`
    pub request_headers: Option<String>,
    /// `ResponseHeaders`
    pub response_headers: Option<String>,
    /// `MediaTypeOptions:n`
    pub media_type_options: Vec<String>,
}

impl HttpLoggingOptions {
    /// Bind the options from a section.
    ///
    /// At the root a bare `Enabled` would be shared with every other setting,
    /// so the switch is read from `HttpLoggingEnabled` instead.
    pub fn from_section(section: &Section<'_>) -> Self {
        let enabled_key = if section.is_root() {
            HTTP_LOGGING_ENABLED_KEY
        } else {
            "Enabled"
        };
        Self {
            enabled: section.is_true(enabled_key),
            clear_request_headers: section.is_true("ClearRequestHeaders"),
            clear_response_headers: section.is_true("ClearResponseHeaders"),
            request_headers: section.get("RequestHeaders").map(str::to_string),
            response_headers: section.get("ResponseHeaders").map(str::to_string),
            media_type_options: section.list("MediaTypeOptions"),
        }
    }
}

// =============================================================================
// Application Config
// =============================================================================

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3000)
    pub port: u16,

    // =========================================================================
    // Forwarded Headers
    // =========================================================================
    /// Process-wide bypass (`FORWARDEDHEADERS_ENABLED`). When set, no
    /// forwarded header is ever applied by this crate.
    pub forwarded_headers_enabled: bool,

    /// Raw forwarded header policy
    pub http_overrides: HttpOverridesOptions,

    /// Reject requests whose forwarded host is not in `AllowedHosts`
    pub host_filtering: bool,

    // =========================================================================
    // Health Probes and Logging
    // =========================================================================
    /// Health probe routing
    pub health_check: HealthCheckOptions,

    /// Request logging allow-lists
    pub http_logging: HttpLoggingOptions,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable text
    pub log_json: bool,

    /// Port for Prometheus metrics endpoint (default: 0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any server setting is invalid
    /// (e.g., non-numeric PORT value).
    pub fn from_env() -> AppResult<Self> {
        Self::from_settings(&Settings::from_env())
    }

    /// Bind configuration from a settings snapshot using the default section names.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Self::from_settings_with_sections(settings, &SectionNames::default())
    }

    /// Bind configuration from a settings snapshot using caller-chosen section names.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn from_settings_with_sections(
        settings: &Settings,
        sections: &SectionNames,
    ) -> AppResult<Self> {
        let root = settings.section("");

        let config = Self {
            // Server
            host: settings
                .get("HOST")
                .map(str::to_string)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: settings.parse_or("PORT", 3000)?,

            // Forwarded headers
            forwarded_headers_enabled: root.is_true(FORWARDED_HEADERS_ENABLED_KEY),
            http_overrides: HttpOverridesOptions::from_section(
                &settings.section(&sections.http_overrides),
            ),
            host_filtering: settings.section(HOST_FILTERING_SECTION).is_true("Enabled"),

            // Health probes and logging
            health_check: HealthCheckOptions::from_section(
                &settings.section(&sections.health_check),
            )?,
            http_logging: HttpLoggingOptions::from_section(
                &settings.section(&sections.http_logging),
            ),

            // Observability
            log_level: settings
                .get("RUST_LOG")
                .map(str::to_string)
                .unwrap_or_else(|| "info".to_string()),
            log_json: settings
                .get("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            metrics_port: settings.parse_or("METRICS_PORT", 0)?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    fn validate(&self) -> AppResult<()> {
        if self.host.trim().is_empty() {
            return Err(AppError::ConfigError("HOST must not be empty".to_string()));
        }

        if self.metrics_port != 0 && self.metrics_port == self.port {
            return Err(AppError::ConfigError(format!(
                "METRICS_PORT ({}) must differ from PORT",
                self.metrics_port
            )));
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        if self.metrics_enabled() {
            Some(std::net::SocketAddr::from((
                [0, 0, 0, 0],
                self.metrics_port,
            )))
        } else {
            None
        }
    }
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            forwarded_headers_enabled: false,
            http_overrides: HttpOverridesOptions::default(),
            host_filtering: false,
            health_check: HealthCheckOptions::default(),
            http_logging: HttpLoggingOptions::default(),
            log_level: "info".to_string(),
            log_json: false,
            metrics_port: 0,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        Settings::from_pairs(pairs.iter().map(|(k, v)| (*k, *v)))
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(!config.forwarded_headers_enabled);
        assert!(config.health_check.enabled);
        assert!(!config.http_logging.enabled);
        assert!(!config.metrics_enabled());
    }

    #[test]
    fn test_empty_settings_match_defaults() {
        let config = Config::from_settings(&Settings::default()).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.http_overrides, HttpOverridesOptions::default());
        assert_eq!(config.health_check, HealthCheckOptions::default());
        assert_eq!(config.http_logging, HttpLoggingOptions::default());
    }

    #[test]
    fn test_server_addr_format() {
        let config = Config {
            host: "localhost".to_string(),
            port: 3000,
            ..Config::default()
        };

        assert_eq!(config.server_addr(), "localhost:3000");
    }

    #[test]
    fn test_env_style_keys_are_case_insensitive() {
        let s = settings(&[("HttpOverrides__KnownProxies", "10.0.0.1")]);

        assert_eq!(
            s.section("httpoverrides").get("KNOWNPROXIES"),
            Some("10.0.0.1")
        );
        assert_eq!(s.get("httpoverrides:knownproxies"), Some("10.0.0.1"));
    }

    #[test]
    fn test_invalid_port_is_config_error() {
        let result = Config::from_settings(&settings(&[("PORT", "not-a-port")]));

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("PORT"));
    }

    #[test]
    fn test_metrics_port_must_differ_from_port() {
        let result = Config::from_settings(&settings(&[("PORT", "9000"), ("METRICS_PORT", "9000")]));

        assert!(result.unwrap_err().to_string().contains("METRICS_PORT"));
    }

    #[test]
    fn test_bypass_read_from_root() {
        let config =
            Config::from_settings(&settings(&[("FORWARDEDHEADERS_ENABLED", "True")])).unwrap();
        assert!(config.forwarded_headers_enabled);

        // The same key inside the section is not the escape hatch
        let config = Config::from_settings(&settings(&[(
            "HttpOverrides:FORWARDEDHEADERS_ENABLED",
            "true",
        )]))
        .unwrap();
        assert!(!config.forwarded_headers_enabled);
    }

    #[test]
    fn test_http_overrides_binding() {
        let config = Config::from_settings(&settings(&[
            ("HttpOverrides:ForwardedForHeaderName", "X-Forwarded-For_1"),
            ("HttpOverrides:ForwardedHeaders", "XForwardedProto,XForwardedHost"),
            ("HttpOverrides:ForwardLimit", "3"),
            ("HttpOverrides:KnownProxies", "192.168.1.1,10.2.3.4"),
            ("HttpOverrides:AllowedHosts:0", "host1"),
            ("HttpOverrides:AllowedHosts:1", "host2.example.com"),
            ("HttpOverrides:AllowedHosts:2", "demo.example.com"),
            ("HttpOverrides:RequireHeaderSymmetry", "true"),
        ]))
        .unwrap();

        let o = &config.http_overrides;
        assert_eq!(
            o.header_names.forwarded_for.as_deref(),
            Some("X-Forwarded-For_1")
        );
        assert_eq!(o.forward_limit.as_deref(), Some("3"));
        assert_eq!(
            o.allowed_hosts,
            vec!["host1", "host2.example.com", "demo.example.com"]
        );
        assert!(o.require_header_symmetry);
        assert!(o.known_networks.is_none());
    }

    #[test]
    fn test_list_orders_by_numeric_index() {
        let s = settings(&[
            ("HealthCheck:Paths:10", "/ten"),
            ("HealthCheck:Paths:2", "/two"),
            ("HealthCheck:Paths:0", "/zero"),
        ]);

        assert_eq!(
            s.section("HealthCheck").list("Paths"),
            vec!["/zero", "/two", "/ten"]
        );
    }

    #[test]
    fn test_allowed_hosts_semicolon_value() {
        let s = settings(&[("HttpOverrides:AllowedHosts", "a.com; *.b.com")]);
        let options = HttpOverridesOptions::from_section(&s.section("HttpOverrides"));

        assert_eq!(options.allowed_hosts, vec!["a.com", "*.b.com"]);
    }

    #[test]
    fn test_health_check_binding() {
        let config = Config::from_settings(&settings(&[
            ("HealthCheck:Enabled", "false"),
            ("HealthCheck:Port", "8081"),
            ("HealthCheck:Prefix", "["),
        ]))
        .unwrap();

        assert!(!config.health_check.enabled);
        assert_eq!(config.health_check.port, Some(8081));
        assert_eq!(config.health_check.prefix.as_deref(), Some("["));
    }

    #[test]
    fn test_health_check_invalid_port() {
        let result = Config::from_settings(&settings(&[("HealthCheck:Port", "70000")]));
        assert!(result.unwrap_err().to_string().contains("Port"));
    }

    #[test]
    fn test_custom_section_names() {
        let sections = SectionNames {
            http_overrides: "Proxy".to_string(),
            health_check: String::new(),
            http_logging: HTTP_LOGGING_SECTION.to_string(),
        };
        let s = settings(&[("Proxy:KnownProxies", "10.0.0.1"), ("Path", "/live")]);
        let config = Config::from_settings_with_sections(&s, &sections).unwrap();

        assert_eq!(
            config.http_overrides.known_proxies.as_deref(),
            Some("10.0.0.1")
        );
        assert_eq!(config.health_check.path.as_deref(), Some("/live"));
    }

    #[test]
    fn test_root_logging_section_uses_prefixed_switch() {
        let sections = SectionNames {
            http_logging: String::new(),
            ..SectionNames::default()
        };

        let s = settings(&[("Enabled", "true"), ("RequestHeaders", "x-trace")]);
        let config = Config::from_settings_with_sections(&s, &sections).unwrap();
        assert!(!config.http_logging.enabled);
        assert_eq!(config.http_logging.request_headers.as_deref(), Some("x-trace"));

        let s = settings(&[("HttpLoggingEnabled", "true")]);
        let config = Config::from_settings_with_sections(&s, &sections).unwrap();
        assert!(config.http_logging.enabled);
    }

    #[test]
    fn test_named_logging_section_uses_enabled() {
        let s = settings(&[("HttpLogging:Enabled", "true"), ("HttpLoggingEnabled", "false")]);
        let config = Config::from_settings(&s).unwrap();
        assert!(config.http_logging.enabled);
    }
}
