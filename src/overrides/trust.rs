//! Immutable trust policy built once at startup.
//!
//! # Construction Rules
//!
//! - Proxy and network lists are tokens separated by any of `,` `|` `;` or
//!   a space. Empty tokens are dropped and duplicates collapsed.
//! - Configuring a list (even with an empty value) replaces the defaults.
//!   `ClearKnownProxies` / `ClearKnownNetworks` also empty the defaults when
//!   no list is configured.
//! - A malformed token is logged and skipped; the rest of the list applies.
//! - When the process-wide bypass is on, nothing else is parsed.
//!
//! # Defaults
//!
//! | Setting          | Default        |
//! |------------------|----------------|
//! | Known proxies    | `::1`          |
//! | Known networks   | `127.0.0.1/8`  |
//! | Header kinds     | none           |
//! | Forward limit    | 1              |
//! | Allowed hosts    | any            |

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::BitOr;

use axum::http::HeaderName;
use tracing::{info, warn};

use super::hosts::AllowedHosts;
use super::network::IpNetwork;
use crate::config::{HeaderNameOverrides, HttpOverridesOptions};

/// Characters separating tokens in proxy/network/header lists.
pub const LIST_SEPARATORS: [char; 4] = [',', '|', ';', ' '];

/// Default number of hops unwound.
pub const DEFAULT_FORWARD_LIMIT: usize = 1;

/// Split a configured list into distinct, non-empty tokens (first occurrence wins).
pub fn split_tokens(value: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = Vec::new();
    for token in value.split(LIST_SEPARATORS).filter(|t| !t.is_empty()) {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

// =============================================================================
// Header Kinds
// =============================================================================

/// Set of forwarded header categories that are honored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ForwardedHeaderKinds(u8);

impl ForwardedHeaderKinds {
    pub const NONE: Self = Self(0);
    /// Client address (`X-Forwarded-For`)
    pub const FOR: Self = Self(1);
    /// Host (`X-Forwarded-Host`)
    pub const HOST: Self = Self(1 << 1);
    /// Scheme (`X-Forwarded-Proto`)
    pub const PROTO: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Parse a flags list such as `"XForwardedFor, XForwardedProto"`.
    ///
    /// Unknown names are logged and ignored.
    pub fn parse(value: &str) -> Self {
        split_tokens(value)
            .into_iter()
            .fold(Self::NONE, |kinds, token| match Self::parse_flag(token) {
                Some(flag) => kinds | flag,
                None => {
                    warn!(flag = %token, "Unknown ForwardedHeaders value, ignoring");
                    kinds
                }
            })
    }

    fn parse_flag(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "none" => Some(Self::NONE),
            "xforwardedfor" => Some(Self::FOR),
            "xforwardedhost" => Some(Self::HOST),
            "xforwardedproto" => Some(Self::PROTO),
            "all" => Some(Self::ALL),
            _ => None,
        }
    }
}

impl BitOr for ForwardedHeaderKinds {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for ForwardedHeaderKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("None");
        }
        let names: Vec<&str> = [
            (Self::FOR, "XForwardedFor"),
            (Self::HOST, "XForwardedHost"),
            (Self::PROTO, "XForwardedProto"),
        ]
        .into_iter()
        .filter(|(kind, _)| self.contains(*kind))
        .map(|(_, name)| name)
        .collect();
        f.write_str(&names.join(","))
    }
}

// =============================================================================
// Header Names
// =============================================================================

/// Wire names of the six forwarded/original headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderNames {
    pub forwarded_for: HeaderName,
    pub forwarded_host: HeaderName,
    pub forwarded_proto: HeaderName,
    pub original_for: HeaderName,
    pub original_host: HeaderName,
    pub original_proto: HeaderName,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            forwarded_for: HeaderName::from_static("x-forwarded-for"),
            forwarded_host: HeaderName::from_static("x-forwarded-host"),
            forwarded_proto: HeaderName::from_static("x-forwarded-proto"),
            original_for: HeaderName::from_static("x-original-for"),
            original_host: HeaderName::from_static("x-original-host"),
            original_proto: HeaderName::from_static("x-original-proto"),
        }
    }
}

impl HeaderNames {
    /// Apply overrides; an empty or invalid name keeps the default.
    pub fn with_overrides(overrides: &HeaderNameOverrides) -> Self {
        let defaults = Self::default();
        let pick = |value: &Option<String>, default: HeaderName, key: &str| match value
            .as_deref()
            .map(str::trim)
        {
            None | Some("") => default,
            Some(name) => HeaderName::from_bytes(name.as_bytes()).unwrap_or_else(|_| {
                warn!(key = %key, name = %name, "Invalid header name, keeping default");
                default
            }),
        };

        Self {
            forwarded_for: pick(
                &overrides.forwarded_for,
                defaults.forwarded_for,
                "ForwardedForHeaderName",
            ),
            forwarded_host: pick(
                &overrides.forwarded_host,
                defaults.forwarded_host,
                "ForwardedHostHeaderName",
            ),
            forwarded_proto: pick(
                &overrides.forwarded_proto,
                defaults.forwarded_proto,
                "ForwardedProtoHeaderName",
            ),
            original_for: pick(
                &overrides.original_for,
                defaults.original_for,
                "OriginalForHeaderName",
            ),
            original_host: pick(
                &overrides.original_host,
                defaults.original_host,
                "OriginalHostHeaderName",
            ),
            original_proto: pick(
                &overrides.original_proto,
                defaults.original_proto,
                "OriginalProtoHeaderName",
            ),
        }
    }
}

// =============================================================================
// Trust Config
// =============================================================================

/// Process-lifetime trust policy for forwarded headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustConfig {
    forward_limit: Option<usize>,
    known_proxies: Vec<IpAddr>,
    known_networks: Vec<IpNetwork>,
    enabled: ForwardedHeaderKinds,
    header_names: HeaderNames,
    allowed_hosts: AllowedHosts,
    require_symmetry: bool,
    bypass_all: bool,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            forward_limit: Some(DEFAULT_FORWARD_LIMIT),
            known_proxies: vec![IpAddr::V6(Ipv6Addr::LOCALHOST)],
            known_networks: vec![IpNetwork::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8)
                .unwrap_or_else(|| IpNetwork::host(IpAddr::V4(Ipv4Addr::LOCALHOST)))],
            enabled: ForwardedHeaderKinds::NONE,
            header_names: HeaderNames::default(),
            allowed_hosts: AllowedHosts::default(),
            require_symmetry: false,
            bypass_all: false,
        }
    }
}

impl TrustConfig {
    /// Build the policy from bound options.
    ///
    /// `bypass` is the process-wide escape hatch; when set the options are not
    /// even looked at and the resulting policy never rewrites anything.
    pub fn build(options: &HttpOverridesOptions, bypass: bool) -> Self {
        if bypass {
            info!("Forwarded headers bypassed by FORWARDEDHEADERS_ENABLED, skipping HttpOverrides settings");
            return Self::bypassed();
        }

        let mut config = Self::default();

        config.enabled = options
            .forwarded_headers
            .as_deref()
            .map(ForwardedHeaderKinds::parse)
            .unwrap_or_default();

        if let Some(raw) = options.forward_limit.as_deref() {
            config.forward_limit = parse_forward_limit(raw);
        }
        if options.clear_forward_limit {
            config.forward_limit = None;
        }

        if options.known_proxies.is_some() || options.clear_known_proxies {
            config.known_proxies = parse_proxies(options.known_proxies.as_deref().unwrap_or(""));
        }

        if options.known_networks.is_some() || options.clear_known_networks {
            config.known_networks =
                parse_networks(options.known_networks.as_deref().unwrap_or(""));
        }

        config.allowed_hosts = AllowedHosts::new(&options.allowed_hosts);
        config.require_symmetry = options.require_header_symmetry;
        config.header_names = HeaderNames::with_overrides(&options.header_names);

        config
    }

    /// Policy that never rewrites anything.
    pub fn bypassed() -> Self {
        Self {
            bypass_all: true,
            ..Self::default()
        }
    }

    pub fn forward_limit(&self) -> Option<usize> {
        self.forward_limit
    }

    pub fn known_proxies(&self) -> &[IpAddr] {
        &self.known_proxies
    }

    pub fn known_networks(&self) -> &[IpNetwork] {
        &self.known_networks
    }

    pub fn enabled(&self) -> ForwardedHeaderKinds {
        self.enabled
    }

    pub fn header_names(&self) -> &HeaderNames {
        &self.header_names
    }

    pub fn allowed_hosts(&self) -> &AllowedHosts {
        &self.allowed_hosts
    }

    pub fn require_symmetry(&self) -> bool {
        self.require_symmetry
    }

    pub fn bypass_all(&self) -> bool {
        self.bypass_all
    }

    /// Whether any rewriting can happen at all.
    pub fn is_active(&self) -> bool {
        !self.bypass_all && !self.enabled.is_empty()
    }

    /// Check if an address is a known proxy or inside a known network.
    ///
    /// IPv4-mapped IPv6 addresses (`::ffff:a.b.c.d`) are also checked in
    /// their IPv4 form, as dual-stack listeners report IPv4 peers that way.
    pub fn is_trusted(&self, addr: &IpAddr) -> bool {
        if self.is_known(addr) {
            return true;
        }

        match addr {
            IpAddr::V6(v6) => v6
                .to_ipv4_mapped()
                .is_some_and(|v4| self.is_known(&IpAddr::V4(v4))),
            IpAddr::V4(_) => false,
        }
    }

    fn is_known(&self, addr: &IpAddr) -> bool {
        self.known_proxies.contains(addr) || self.known_networks.iter().any(|n| n.contains(addr))
    }

    /// Log the effective policy at startup.
    pub fn log_summary(&self) {
        if self.bypass_all {
            info!("Bypass HttpOverrides configuration settings because FORWARDEDHEADERS_ENABLED is True");
            return;
        }

        info!(
            forward_limit = ?self.forward_limit,
            known_proxies = %join(&self.known_proxies),
            known_networks = %join(&self.known_networks),
            forwarded_headers = %self.enabled,
            require_header_symmetry = self.require_symmetry,
            "Forwarded headers policy"
        );

        if !self.allowed_hosts.is_empty() {
            info!(allowed_hosts = %self.allowed_hosts, "AllowedHosts");
        }
    }
}

/// Empty means unlimited; invalid values fall back to the default limit.
fn parse_forward_limit(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<usize>() {
        Ok(limit) => Some(limit),
        Err(e) => {
            warn!(value = %raw, error = %e, "Invalid ForwardLimit, using default");
            Some(DEFAULT_FORWARD_LIMIT)
        }
    }
}

fn parse_proxies(raw: &str) -> Vec<IpAddr> {
    let mut proxies = Vec::new();
    for token in split_tokens(raw) {
        match token.parse::<IpAddr>() {
            Ok(ip) if !proxies.contains(&ip) => proxies.push(ip),
            Ok(_) => {}
            Err(_) => warn!(proxy = %token, "Invalid KnownProxies entry, skipping"),
        }
    }
    proxies
}

fn parse_networks(raw: &str) -> Vec<IpNetwork> {
    let mut networks = Vec::new();
    for token in split_tokens(raw) {
        match IpNetwork::parse(token) {
            Some(net) if !networks.contains(&net) => networks.push(net),
            Some(_) => {}
            None => warn!(network = %token, "Invalid KnownNetworks entry, skipping"),
        }
    }
    networks
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
