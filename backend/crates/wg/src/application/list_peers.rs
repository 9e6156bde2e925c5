//! List Peers Use Case
//!
//! Joins desired-state rows with parsed live interface status by public
//! key. A peer with no live entry shows as provisioned-but-inactive,
//! which also covers the transient window between the desired-state
//! insert and the live apply.

use std::sync::Arc;

use kernel::principal::Principal;

use crate::domain::entity::PeerListing;
use crate::domain::repository::{PeerControl, PeerRepository};
use crate::domain::status::{LivePeerStatus, parse_status};
use crate::error::{WgError, WgResult};

/// One peer with its live status, if any
#[derive(Debug)]
pub struct PeerStatusView {
    pub listing: PeerListing,
    pub live: Option<LivePeerStatus>,
}

/// List peers use case
pub struct ListPeersUseCase<R, C>
where
    R: PeerRepository,
    C: PeerControl,
{
    repo: Arc<R>,
    control: Arc<C>,
}

impl<R, C> ListPeersUseCase<R, C>
where
    R: PeerRepository,
    C: PeerControl,
{
    pub fn new(repo: Arc<R>, control: Arc<C>) -> Self {
        Self { repo, control }
    }

    pub async fn execute(&self, principal: &Principal) -> WgResult<Vec<PeerStatusView>> {
        if !principal.is_superadmin {
            return Err(WgError::Forbidden);
        }

        let listings = self.repo.list_all().await?;
        let mut live = parse_status(&self.control.status_text().await?);

        Ok(listings
            .into_iter()
            .map(|listing| {
                let status = live.remove(&listing.peer.public_key);
                PeerStatusView {
                    listing,
                    live: status,
                }
            })
            .collect())
    }
}
