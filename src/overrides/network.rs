//! CIDR network matching for known proxy networks.
//!
//! A network is kept as its base address plus a prefix length. The base is
//! stored exactly as configured (so `127.0.0.1/8` still prints as
//! `127.0.0.1/8`); masking happens when an address is tested.

use std::fmt;
use std::net::IpAddr;

/// Parsed CIDR network range, e.g. `10.0.0.0/8` or `2001:db8::/32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpNetwork {
    /// Base address as configured
    base: IpAddr,
    /// Prefix length (e.g., 24 for /24)
    prefix_len: u8,
}

impl IpNetwork {
    /// Create a network, returning `None` if the prefix is wider than the family allows.
    pub fn new(base: IpAddr, prefix_len: u8) -> Option<Self> {
        (prefix_len <= max_prefix(&base)).then_some(Self { base, prefix_len })
    }

    /// Single-address network (`/32` for IPv4, `/128` for IPv6).
    pub fn host(addr: IpAddr) -> Self {
        Self {
            base: addr,
            prefix_len: max_prefix(&addr),
        }
    }

    /// Parse `address` or `address/prefixLength`.
    ///
    /// Returns `None` if the format is invalid.
    pub fn parse(cidr: &str) -> Option<Self> {
        let cidr = cidr.trim();
        match cidr.split_once('/') {
            None => cidr.parse().ok().map(Self::host),
            Some((addr, prefix)) => {
                let base: IpAddr = addr.trim().parse().ok()?;
                let prefix_len: u8 = prefix.trim().parse().ok()?;
                Self::new(base, prefix_len)
            }
        }
    }

    /// Base address as configured.
    pub fn base(&self) -> IpAddr {
        self.base
    }

    /// Prefix length in bits.
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Check if an IP address is contained within this network.
    ///
    /// An address of the other family never matches.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        match (&self.base, ip) {
            (IpAddr::V4(net), IpAddr::V4(addr)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix_len)).unwrap_or(0);
                (u32::from(*net) & mask) == (u32::from(*addr) & mask)
            }
            (IpAddr::V6(net), IpAddr::V6(addr)) => {
                let mask = u128::MAX
                    .checked_shl(128 - u32::from(self.prefix_len))
                    .unwrap_or(0);
                (u128::from(*net) & mask) == (u128::from(*addr) & mask)
            }
            _ => false,
        }
    }
}

impl fmt::Display for IpNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.prefix_len)
    }
}

fn max_prefix(addr: &IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}
