//! Delete Peer Use Case
//!
//! Live removal first, best-effort; the desired-state row goes away
//! regardless. A peer can always be forgotten even when the live
//! interface is unreachable, at the cost of a possible stale live entry.

use std::sync::Arc;

use kernel::id::PeerId;
use kernel::principal::Principal;

use crate::domain::repository::{PeerControl, PeerRepository};
use crate::error::{WgError, WgResult};

/// Delete peer use case
pub struct DeletePeerUseCase<R, C>
where
    R: PeerRepository,
    C: PeerControl,
{
    repo: Arc<R>,
    control: Arc<C>,
}

impl<R, C> DeletePeerUseCase<R, C>
where
    R: PeerRepository,
    C: PeerControl,
{
    pub fn new(repo: Arc<R>, control: Arc<C>) -> Self {
        Self { repo, control }
    }

    pub async fn execute(&self, principal: &Principal, peer_id: &PeerId) -> WgResult<()> {
        if !principal.is_superadmin {
            return Err(WgError::Forbidden);
        }

        let Some(peer) = self.repo.find_by_id(peer_id).await? else {
            // Already forgotten; deletion is idempotent
            return Ok(());
        };

        if let Err(e) = self.control.remove_peer(&peer.public_key).await {
            tracing::warn!(
                public_key = %peer.public_key,
                error = %e,
                "Live peer removal failed; deleting desired state anyway"
            );
        }

        self.repo.delete_by_id(peer_id).await?;

        tracing::info!(label = %peer.label, address = %peer.address_cidr, "Peer deleted");

        Ok(())
    }
}
