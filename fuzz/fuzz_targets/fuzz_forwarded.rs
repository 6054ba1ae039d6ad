//! Fuzz testing for forwarded header parsing and resolution.
//!
//! Checks that no input makes the value parsers or the resolver panic, and
//! that the resolver never unwinds more hops than the configured limit.
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! # Install cargo-fuzz (requires nightly)
//! cargo +nightly install cargo-fuzz
//!
//! # Run the target
//! cargo +nightly fuzz run fuzz_forwarded
//!
//! # Run with a time limit (e.g., 60 seconds)
//! cargo +nightly fuzz run fuzz_forwarded -- -max_total_time=60
//! ```

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use http_overrides::config::HttpOverridesOptions;
use http_overrides::overrides::{ForwardedHeaderResolver, IpNetwork, RequestContext, TrustConfig};
use http_overrides::validation::{
    is_valid_host, is_valid_probe_path, is_valid_scheme, parse_forwarded_for, split_host_port,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    forwarded_for: &'a str,
    forwarded_host: &'a str,
    forwarded_proto: &'a str,
    known_networks: &'a str,
    forward_limit: u8,
    symmetry: bool,
    remote: [u8; 4],
}

fuzz_target!(|input: Input<'_>| {
    // Value parsers (shouldn't panic)
    let _ = parse_forwarded_for(input.forwarded_for);
    let _ = is_valid_host(input.forwarded_host);
    let _ = split_host_port(input.forwarded_host);
    let _ = is_valid_scheme(input.forwarded_proto);
    let _ = is_valid_probe_path(input.forwarded_proto);
    let _ = IpNetwork::parse(input.known_networks);

    let limit = usize::from(input.forward_limit % 8);
    let options = HttpOverridesOptions {
        forwarded_headers: Some("All".to_string()),
        forward_limit: Some(limit.to_string()),
        known_networks: Some(input.known_networks.to_string()),
        require_header_symmetry: input.symmetry,
        ..Default::default()
    };
    let resolver = ForwardedHeaderResolver::new(Arc::new(TrustConfig::build(&options, false)));

    let remote = std::net::SocketAddr::from((input.remote, 443));
    let mut ctx = RequestContext::new(Some(remote), 80, "/")
        .with_header("x-forwarded-for", input.forwarded_for)
        .with_header("x-forwarded-host", input.forwarded_host)
        .with_header("x-forwarded-proto", input.forwarded_proto);

    let resolution = resolver.resolve(&mut ctx);
    assert!(resolution.hops <= limit);
});
