//! Forwarded header resolution.
//!
//! # Chain Walk
//!
//! ```text
//! X-Forwarded-For: client, proxy1, proxy2      (peer = proxy3)
//!                    ^       ^       ^
//!                 hop 2   hop 1   hop 0
//! ```
//!
//! Starting from the immediate peer, each hop is taken only while the current
//! address is a known proxy (or inside a known network) and the forward limit
//! has not been reached. The values of a hop are read from the end of each
//! header list since every proxy appends its own entry.
//!
//! A hop is all or nothing: every enabled kind present at the hop must parse
//! (and the host must be allowed) before any of them is applied. Anything
//! unexpected ends the walk; it never fails the request.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use super::context::RequestContext;
use super::trust::{ForwardedHeaderKinds, HeaderNames, TrustConfig};
use crate::validation::{is_valid_host, is_valid_scheme, parse_forwarded_for};

/// Why the walk ended, used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Bypass is on or no header kind is enabled
    Disabled,
    /// The context was left as it was
    Unchanged,
    /// At least one hop was applied
    Applied,
    /// A forwarded host was not in the allowed list
    HostRejected,
    /// Symmetry was required but the header lists differ in length
    Asymmetric,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Unchanged => "unchanged",
            Self::Applied => "applied",
            Self::HostRejected => "host_rejected",
            Self::Asymmetric => "asymmetric",
        }
    }
}

/// Result of resolving one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Number of hops unwound
    pub hops: usize,
    /// Kinds that were applied at least once
    pub applied: ForwardedHeaderKinds,
    /// Forwarded host that stopped the walk because it is not allowed
    pub host_rejected: Option<String>,
    pub outcome: Outcome,
}

impl Resolution {
    fn new(outcome: Outcome) -> Self {
        Self {
            hops: 0,
            applied: ForwardedHeaderKinds::NONE,
            host_rejected: None,
            outcome,
        }
    }
}

/// Values of one header, in append order.
struct ForwardedList {
    values: Vec<String>,
    consumed: usize,
}

impl ForwardedList {
    fn read(headers: &HeaderMap, name: &HeaderName) -> Self {
        let values = headers
            .get_all(name)
            .iter()
            .flat_map(|v| {
                String::from_utf8_lossy(v.as_bytes())
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            values,
            consumed: 0,
        }
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    /// Value at `hop`, counting from the nearest proxy.
    fn at_hop(&self, hop: usize) -> Option<&str> {
        self.values
            .len()
            .checked_sub(hop + 1)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Entries that were not consumed, joined for writing back.
    fn remaining(&self) -> Option<String> {
        let keep = self.values.len().saturating_sub(self.consumed);
        (keep > 0).then(|| self.values.iter().take(keep).cloned().collect::<Vec<_>>().join(", "))
    }
}

/// Values of one hop that passed validation.
#[derive(Default)]
struct Hop {
    client: Option<SocketAddr>,
    host: Option<String>,
    scheme: Option<String>,
}

/// Connection values as they were before the walk.
struct Original {
    remote: Option<SocketAddr>,
    host: Option<String>,
    scheme: String,
}

/// Walks the forwarded chain of a request under a fixed [`TrustConfig`].
#[derive(Debug, Clone)]
pub struct ForwardedHeaderResolver {
    config: Arc<TrustConfig>,
}

impl ForwardedHeaderResolver {
    pub fn new(config: Arc<TrustConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrustConfig {
        &self.config
    }

    /// Resolve the request, rewriting the context in place.
    ///
    /// Never fails. With bypass on or no kinds enabled the context is not
    /// touched at all.
    pub fn resolve(&self, ctx: &mut RequestContext) -> Resolution {
        let config = &*self.config;
        if !config.is_active() {
            return Resolution::new(Outcome::Disabled);
        }

        let enabled = config.enabled();
        let names = config.header_names();
        let check_for = enabled.contains(ForwardedHeaderKinds::FOR);
        let check_host = enabled.contains(ForwardedHeaderKinds::HOST);
        let check_proto = enabled.contains(ForwardedHeaderKinds::PROTO);

        let mut for_list = read_if(check_for, &ctx.headers, &names.forwarded_for);
        let mut host_list = read_if(check_host, &ctx.headers, &names.forwarded_host);
        let mut proto_list = read_if(check_proto, &ctx.headers, &names.forwarded_proto);

        let lengths: Vec<usize> = [&for_list, &host_list, &proto_list]
            .into_iter()
            .flatten()
            .map(ForwardedList::len)
            .collect();

        if config.require_symmetry() && lengths.windows(2).any(|w| w.first() != w.get(1)) {
            warn!(
                lengths = ?lengths,
                "Forwarded header lists differ in length, ignoring forwarded headers"
            );
            return Resolution::new(Outcome::Asymmetric);
        }

        let mut entries = lengths.iter().copied().max().unwrap_or(0);
        if let Some(limit) = config.forward_limit() {
            entries = entries.min(limit);
        }

        let mut resolution = Resolution::new(Outcome::Unchanged);
        let mut current = ctx.remote_addr;
        let original = Original {
            remote: ctx.remote_socket(),
            host: ctx.host.clone(),
            scheme: ctx.scheme.clone(),
        };

        for hop in 0..entries {
            let trusted = current.is_some_and(|addr| config.is_trusted(&addr));
            if !trusted {
                debug!(hop, remote = ?current, "Unknown proxy, stopping forwarded header walk");
                break;
            }

            let mut next = Hop::default();

            if let Some(list) = &for_list {
                match list.at_hop(hop) {
                    Some(value) => match parse_forwarded_for(value) {
                        Some(addr) => next.client = Some(addr),
                        None => {
                            debug!(hop, value = %value, "Unparsable forwarded-for value");
                            break;
                        }
                    },
                    None if config.require_symmetry() => break,
                    None => {}
                }
            }

            if let Some(list) = &host_list {
                match list.at_hop(hop) {
                    Some(value) if !is_valid_host(value) => {
                        debug!(hop, value = %value, "Invalid forwarded host value");
                        break;
                    }
                    Some(value) if !config.allowed_hosts().is_allowed(value) => {
                        warn!(hop, host = %value, "Forwarded host is not allowed");
                        resolution.host_rejected = Some(value.to_string());
                        break;
                    }
                    Some(value) => next.host = Some(value.to_string()),
                    None if config.require_symmetry() => break,
                    None => {}
                }
            }

            if let Some(list) = &proto_list {
                match list.at_hop(hop) {
                    Some(value) if !is_valid_scheme(value) => {
                        debug!(hop, value = %value, "Invalid forwarded proto value");
                        break;
                    }
                    Some(value) => next.scheme = Some(value.to_ascii_lowercase()),
                    None if config.require_symmetry() => break,
                    None => {}
                }
            }

            if next.client.is_none() && next.host.is_none() && next.scheme.is_none() {
                break;
            }

            if let (Some(addr), Some(list)) = (next.client, for_list.as_mut()) {
                ctx.remote_addr = Some(addr.ip());
                ctx.remote_port = addr.port();
                current = Some(addr.ip());
                list.consumed += 1;
                resolution.applied = resolution.applied | ForwardedHeaderKinds::FOR;
            }
            if let (Some(host), Some(list)) = (next.host, host_list.as_mut()) {
                ctx.host = Some(host);
                list.consumed += 1;
                resolution.applied = resolution.applied | ForwardedHeaderKinds::HOST;
            }
            if let (Some(scheme), Some(list)) = (next.scheme, proto_list.as_mut()) {
                ctx.scheme = scheme;
                list.consumed += 1;
                resolution.applied = resolution.applied | ForwardedHeaderKinds::PROTO;
            }

            resolution.hops += 1;
        }

        if resolution.hops > 0 {
            resolution.outcome = Outcome::Applied;
            write_back(ctx, &original, names, [&for_list, &host_list, &proto_list]);
        }
        if resolution.host_rejected.is_some() {
            resolution.outcome = Outcome::HostRejected;
        }

        resolution
    }
}

fn read_if(enabled: bool, headers: &HeaderMap, name: &HeaderName) -> Option<ForwardedList> {
    enabled.then(|| ForwardedList::read(headers, name))
}

/// Record the original values and drop the consumed forwarded entries.
fn write_back(
    ctx: &mut RequestContext,
    original: &Original,
    names: &HeaderNames,
    lists: [&Option<ForwardedList>; 3],
) {
    let [for_list, host_list, proto_list] = lists;

    if let Some(list) = for_list.as_ref().filter(|l| l.consumed > 0) {
        if let Some(remote) = original.remote {
            set_header(&mut ctx.headers, &names.original_for, Some(remote.to_string()));
        }
        set_header(&mut ctx.headers, &names.forwarded_for, list.remaining());
    }

    if let Some(list) = host_list.as_ref().filter(|l| l.consumed > 0) {
        if let Some(host) = &original.host {
            set_header(&mut ctx.headers, &names.original_host, Some(host.clone()));
        }
        set_header(&mut ctx.headers, &names.forwarded_host, list.remaining());
    }

    if let Some(list) = proto_list.as_ref().filter(|l| l.consumed > 0) {
        set_header(
            &mut ctx.headers,
            &names.original_proto,
            Some(original.scheme.clone()),
        );
        set_header(&mut ctx.headers, &names.forwarded_proto, list.remaining());
    }
}

fn set_header(headers: &mut HeaderMap, name: &HeaderName, value: Option<String>) {
    match value.and_then(|v| HeaderValue::from_str(&v).ok()) {
        Some(value) => {
            headers.insert(name.clone(), value);
        }
        None => {
            headers.remove(name);
        }
    }
}
