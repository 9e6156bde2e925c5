//! Domain Entities

use chrono::{DateTime, Utc};
use kernel::id::{PeerId, SiteId, UserId};

/// One network definition: its WireGuard subnet in CIDR form. The address
/// part of the CIDR is the gateway (the interface's own address).
#[derive(Debug, Clone)]
pub struct Site {
    pub site_id: SiteId,
    /// e.g. `10.88.0.1/24`
    pub wg_interface_ip: String,
}

/// A provisioned VPN endpoint (desired state).
#[derive(Debug, Clone)]
pub struct Peer {
    pub peer_id: PeerId,
    pub site_id: SiteId,
    /// Optional owning user
    pub user_id: Option<UserId>,
    pub label: String,
    pub public_key: String,
    pub preshared_key: Option<String>,
    /// Single-host CIDR allocated from the site subnet, e.g. `10.88.0.2/32`
    pub address_cidr: String,
    /// Client-facing allowed-IPs string for the generated config
    pub allowed_ips: String,
    pub dns_servers: Option<String>,
    pub persistent_keepalive_s: Option<i32>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl Peer {
    /// Create a new enabled peer for a site.
    pub fn new(
        site_id: SiteId,
        label: impl Into<String>,
        public_key: impl Into<String>,
        address_cidr: impl Into<String>,
        allowed_ips: impl Into<String>,
        persistent_keepalive_s: Option<i32>,
    ) -> Self {
        Self {
            peer_id: PeerId::new(),
            site_id,
            user_id: None,
            label: label.into(),
            public_key: public_key.into(),
            preshared_key: None,
            address_cidr: address_cidr.into(),
            allowed_ips: allowed_ips.into(),
            dns_servers: None,
            persistent_keepalive_s,
            enabled: true,
            created_at: Utc::now(),
        }
    }
}

/// A peer row joined with its owner's username for listings.
#[derive(Debug, Clone)]
pub struct PeerListing {
    pub peer: Peer,
    pub owner_username: Option<String>,
}
