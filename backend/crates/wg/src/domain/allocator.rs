//! Address Allocator
//!
//! Pure next-free-host computation over a site's IPv4 subnet. The caller
//! supplies the set of addresses already assigned to peers; persistence
//! (and the race between concurrent allocations) is handled by the unique
//! constraint + retry in the application layer.

use std::collections::HashSet;
use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;

use crate::error::{WgError, WgResult};

/// Compute the next free host address in `interface_cidr`.
///
/// The CIDR's address part is the gateway (the interface's own address,
/// conventionally the first usable host). The scan walks the host range in
/// ascending order, skipping the gateway and every ordinal at or below it,
/// and returns the first address not present in `used`.
pub fn next_host_address(
    interface_cidr: &str,
    used: &HashSet<Ipv4Addr>,
) -> WgResult<Ipv4Addr> {
    let network: Ipv4Network = interface_cidr
        .parse()
        .map_err(|_| WgError::InvalidSubnet(interface_cidr.to_string()))?;

    let gateway = u32::from(network.ip());
    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());

    // Host range excludes the network and broadcast addresses
    for ordinal in (first + 1)..last {
        if ordinal <= gateway {
            continue;
        }
        let candidate = Ipv4Addr::from(ordinal);
        if !used.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(WgError::PoolExhausted)
}

/// Render an allocated host as the single-host CIDR stored on the peer.
pub fn host_cidr(address: Ipv4Addr) -> String {
    format!("{address}/32")
}

/// Parse the host address out of a stored `address_cidr` value.
/// Unparseable rows are skipped, matching how the allocator treats them.
pub fn parse_host(address_cidr: &str) -> Option<Ipv4Addr> {
    let host = address_cidr.split('/').next()?;
    host.trim().parse().ok()
}
