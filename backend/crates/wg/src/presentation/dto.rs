//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::PeerStatusView;

// ============================================================================
// Peer Creation
// ============================================================================

/// Create peer request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeerRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub allowed_ips: Option<String>,
    #[serde(default)]
    pub keepalive: Option<i32>,
}

// ============================================================================
// Peer Listing
// ============================================================================

/// Live status of a peer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveStatusResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_ips: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_handshake: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<String>,
}

/// One peer in the listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerResponse {
    pub id: Uuid,
    pub label: String,
    pub public_key: String,
    pub address_cidr: String,
    pub allowed_ips: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<i32>,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Absent for provisioned-but-inactive peers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<LiveStatusResponse>,
}

impl From<PeerStatusView> for PeerResponse {
    fn from(view: PeerStatusView) -> Self {
        let peer = view.listing.peer;
        Self {
            id: *peer.peer_id.as_uuid(),
            label: peer.label,
            public_key: peer.public_key,
            address_cidr: peer.address_cidr,
            allowed_ips: peer.allowed_ips,
            keepalive: peer.persistent_keepalive_s,
            enabled: peer.enabled,
            owner: view.listing.owner_username,
            live: view.live.map(|s| LiveStatusResponse {
                endpoint: s.endpoint,
                allowed_ips: s.allowed_ips,
                latest_handshake: s.latest_handshake,
                transfer: s.transfer,
            }),
        }
    }
}
