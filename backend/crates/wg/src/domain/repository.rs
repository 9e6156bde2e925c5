//! Repository & Control-Surface Traits
//!
//! The control surface is a trait for the same reason the repositories
//! are: peer creation's compensating rollback is only testable when the
//! live apply can be made to fail on demand.

use kernel::id::{PeerId, SiteId};
use zeroize::Zeroizing;

use crate::domain::entity::{Peer, PeerListing, Site};
use crate::error::WgResult;

/// Outcome of a desired-state insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The `(site_id, address_cidr)` unique constraint fired: another
    /// request claimed the address first. The caller re-allocates.
    AddressTaken,
}

/// A freshly generated WireGuard keypair.
///
/// The private key is wiped from memory on drop and must never be
/// persisted or logged.
pub struct Keypair {
    pub private_key: Zeroizing<String>,
    pub public_key: String,
}

/// Site repository trait
#[trait_variant::make(SiteRepository: Send)]
pub trait LocalSiteRepository {
    /// The first configured site (single-site deployment convention)
    async fn first_site(&self) -> WgResult<Option<Site>>;
}

/// Peer repository trait
#[trait_variant::make(PeerRepository: Send)]
pub trait LocalPeerRepository {
    /// Insert a desired-state row; reports an address conflict instead of
    /// failing so allocation can retry
    async fn insert(&self, peer: &Peer) -> WgResult<InsertOutcome>;

    /// All peers joined with their owners' usernames, newest first
    async fn list_all(&self) -> WgResult<Vec<PeerListing>>;

    /// Addresses currently assigned to peers of a site
    async fn addresses_for_site(&self, site_id: &SiteId) -> WgResult<Vec<String>>;

    /// Find one peer by id
    async fn find_by_id(&self, peer_id: &PeerId) -> WgResult<Option<Peer>>;

    /// Delete by id
    async fn delete_by_id(&self, peer_id: &PeerId) -> WgResult<()>;

    /// Delete by public key (compensating rollback path)
    async fn delete_by_public_key(&self, public_key: &str) -> WgResult<()>;
}

/// Control-surface trait: the live WireGuard interface.
#[trait_variant::make(PeerControl: Send)]
pub trait LocalPeerControl {
    /// Generate a keypair via the control surface's key primitives
    async fn generate_keypair(&self) -> WgResult<Keypair>;

    /// Apply a peer to the live interface
    async fn add_peer(
        &self,
        public_key: &str,
        allowed_ips: &str,
        keepalive: Option<u16>,
    ) -> WgResult<()>;

    /// Remove a peer from the live interface
    async fn remove_peer(&self, public_key: &str) -> WgResult<()>;

    /// Raw status dump (`show`)
    async fn status_text(&self) -> WgResult<String>;
}
