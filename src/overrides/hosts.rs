//! Allowed host patterns for forwarded `Host` values.

use std::fmt;

use tracing::warn;

use crate::validation::split_host_port;

/// One allowed-host pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostPattern {
    /// `*` - any host
    Any,
    /// `example.com` - exact, case-insensitive
    Exact(String),
    /// `*.example.com` - any subdomain, stored as `.example.com`
    Subdomain(String),
}

impl HostPattern {
    /// Parse a configured pattern. Ports are ignored; empty patterns yield `None`.
    pub fn parse(pattern: &str) -> Option<Self> {
        let pattern = pattern.trim();
        if pattern == "*" {
            return Some(Self::Any);
        }

        let name = host_name(pattern)?.to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }

        match name.strip_prefix("*.") {
            Some(suffix) if !suffix.is_empty() => Some(Self::Subdomain(format!(".{suffix}"))),
            Some(_) => None,
            None => Some(Self::Exact(name)),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(exact) => name.eq_ignore_ascii_case(exact),
            Self::Subdomain(suffix) => {
                name.len() > suffix.len()
                    && name
                        .get(name.len() - suffix.len()..)
                        .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
            }
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Exact(name) => f.write_str(name),
            Self::Subdomain(suffix) => write!(f, "*{suffix}"),
        }
    }
}

/// Ordered set of allowed host patterns. Empty means every host is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedHosts {
    patterns: Vec<HostPattern>,
}

impl AllowedHosts {
    /// Parse configured patterns, skipping (and logging) invalid ones.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| {
                let parsed = HostPattern::parse(p.as_ref());
                if parsed.is_none() {
                    warn!(pattern = %p.as_ref(), "Invalid AllowedHosts entry, skipping");
                }
                parsed
            })
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Check a `host[:port]` value; the port never takes part in matching.
    pub fn is_allowed(&self, host: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }

        match host_name(host) {
            Some(name) => self.patterns.iter().any(|p| p.matches(name)),
            None => false,
        }
    }
}

impl fmt::Display for AllowedHosts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pattern) in self.patterns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{pattern}")?;
        }
        Ok(())
    }
}

fn host_name(host: &str) -> Option<&str> {
    split_host_port(host.trim()).map(|(name, _)| name)
}
