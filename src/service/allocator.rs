//! Client address allocation inside the tunnel's /24.
//!
//! The server holds `.1`; `.0` and `.255` are never handed out. Every other
//! host number is free unless some registered peer's allowed-address ends in it.
//! Nothing is reserved on the router while the enrollment runs, so two
//! concurrent enrollments can pick the same address.

use std::{collections::BTreeSet, fmt, net::Ipv4Addr};

use tracing::warn;

use super::ServiceError;
use crate::routeros::wireguard::Peer;

pub const FIRST_HOST: u8 = 2;
pub const LAST_HOST: u8 = 254;

/// First three octets of the tunnel network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subnet([u8; 3]);

impl Subnet {
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        Self([a, b, c])
    }

    /// Parses an interface address as reported by the router, with or
    /// without a prefix length (`192.168.100.1/24`, `192.168.100.1`).
    pub fn from_interface_address(address: &str) -> Option<Self> {
        let host = address.split('/').next()?.trim();
        let [a, b, c, _] = host.parse::<Ipv4Addr>().ok()?.octets();
        Some(Self([a, b, c]))
    }

    pub fn host(&self, n: u8) -> Ipv4Addr {
        let [a, b, c] = self.0;
        Ipv4Addr::new(a, b, c, n)
    }
}

impl fmt::Display for Subnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}.{b}.{c}")
    }
}

/// Trailing host number of one allowed-address entry, `10.0.0.5/32` -> 5.
pub fn host_octet(entry: &str) -> Option<u8> {
    let last = entry.trim().rsplit('.').next()?;
    last.split('/').next()?.parse().ok()
}

/// Host numbers already taken by `peers`.
///
/// A peer may list several comma separated entries; each one counts.
/// Entries that don't end in a host number are skipped.
pub fn used_hosts<'a>(peers: impl IntoIterator<Item = &'a Peer>) -> BTreeSet<u8> {
    let mut used = BTreeSet::new();
    for peer in peers {
        let Some(allowed) = peer.allowed_address.as_deref() else {
            continue;
        };
        for entry in allowed.split(',').filter(|e| !e.trim().is_empty()) {
            match host_octet(entry) {
                Some(n) => {
                    used.insert(n);
                }
                None => warn!(
                    "skipping unparsable allowed-address {entry:?} of peer {}",
                    peer.id.as_deref().unwrap_or("?")
                ),
            }
        }
    }
    used
}

/// Lowest free host address in `subnet`.
pub fn allocate(peers: &[Peer], subnet: Subnet) -> Result<Ipv4Addr, ServiceError> {
    let used = used_hosts(peers);
    (FIRST_HOST..=LAST_HOST)
        .find(|n| !used.contains(n))
        .map(|n| subnet.host(n))
        .ok_or(ServiceError::PoolExhausted)
}
