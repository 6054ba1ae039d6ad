//! Validation of values received in forwarded headers and configuration.
//!
//! Everything here is a pure predicate or parser over untrusted text. None of
//! these functions panic, whatever the input; the fuzz target in `fuzz/`
//! exercises exactly that.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};

// =============================================================================
// Validation Constants
// =============================================================================

/// Maximum length of a forwarded host value.
///
/// Matches the DNS limit for a fully qualified name, plus room for a port.
pub const MAX_HOST_LENGTH: usize = 261;

/// Maximum length of a forwarded scheme value.
pub const MAX_SCHEME_LENGTH: usize = 32;

/// Parse one `X-Forwarded-For` entry into an address and port.
///
/// Accepted forms:
/// - `203.0.113.5` / `2001:db8::1` (port 0)
/// - `203.0.113.5:8080` / `[2001:db8::1]:8080`
/// - `[2001:db8::1]` (port 0)
///
/// Returns `None` for anything else, including host names and `unknown`.
pub fn parse_forwarded_for(value: &str) -> Option<SocketAddr> {
    let value = value.trim();

    if let Ok(addr) = value.parse::<SocketAddr>() {
        return Some(addr);
    }

    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(SocketAddr::new(ip, 0));
    }

    let inner = value.strip_prefix('[')?.strip_suffix(']')?;
    inner
        .parse::<Ipv6Addr>()
        .ok()
        .map(|ip| SocketAddr::new(IpAddr::V6(ip), 0))
}

/// Validate a URI scheme (`ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`).
pub fn is_valid_scheme(scheme: &str) -> bool {
    if scheme.is_empty() || scheme.len() > MAX_SCHEME_LENGTH {
        return false;
    }

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Validate a `host[:port]` value as it may appear in a `Host` header.
///
/// IPv6 literals must be bracketed. The port, when present, must be numeric.
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty() || host.len() > MAX_HOST_LENGTH {
        return false;
    }

    let (name, port) = match split_host_port(host) {
        Some(parts) => parts,
        None => return false,
    };

    if let Some(port) = port
        && (port.is_empty() || port.len() > 5 || !port.bytes().all(|b| b.is_ascii_digit()))
    {
        return false;
    }

    if let Some(literal) = name.strip_prefix('[') {
        return literal
            .strip_suffix(']')
            .is_some_and(|ip| ip.parse::<Ipv6Addr>().is_ok());
    }

    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'%'))
}

/// Split `host[:port]`, keeping bracketed IPv6 literals intact.
///
/// Returns `None` when an unbracketed value contains more than one colon.
pub fn split_host_port(host: &str) -> Option<(&str, Option<&str>)> {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => {
                let (name, rest) = host.split_at(end + 1);
                match rest.strip_prefix(':') {
                    Some(port) => Some((name, Some(port))),
                    None if rest.is_empty() => Some((name, None)),
                    None => None,
                }
            }
            None => None,
        };
    }

    match host.split_once(':') {
        Some((_, port)) if port.contains(':') => None,
        Some((name, port)) => Some((name, Some(port))),
        None => Some((host, None)),
    }
}

/// Validate a configured health probe path: non-empty and rooted at `/`.
pub fn is_valid_probe_path(path: &str) -> bool {
    path.starts_with('/') && !path.chars().any(|c| c.is_whitespace() || c == '?' || c == '#')
}
