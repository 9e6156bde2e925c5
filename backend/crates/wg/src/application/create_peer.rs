//! Create Peer Use Case
//!
//! Two-phase provisioning: the desired-state row is committed first, then
//! applied to the live interface. A failed live apply deletes the row
//! again - the datastore must never keep a peer that was never actually
//! applied. Address allocation runs under the `(site_id, address_cidr)`
//! unique constraint with a bounded retry, so two concurrent creations
//! cannot end up sharing an address.

use std::collections::HashSet;
use std::sync::Arc;

use kernel::principal::Principal;

use crate::application::config::WgConfig;
use crate::domain::allocator::{host_cidr, next_host_address, parse_host};
use crate::domain::entity::Peer;
use crate::domain::repository::{
    InsertOutcome, PeerControl, PeerRepository, SiteRepository,
};
use crate::error::{WgError, WgResult};

/// Create peer input
#[derive(Debug, Default)]
pub struct CreatePeerInput {
    /// Display label; blank falls back to the configured default
    pub label: Option<String>,
    /// Client-facing allowed-IPs; blank falls back to the configured default
    pub allowed_ips: Option<String>,
    /// Persistent keepalive seconds
    pub keepalive: Option<i32>,
}

/// Create peer use case
pub struct CreatePeerUseCase<R, C>
where
    R: SiteRepository + PeerRepository,
    C: PeerControl,
{
    repo: Arc<R>,
    control: Arc<C>,
    config: Arc<WgConfig>,
}

impl<R, C> CreatePeerUseCase<R, C>
where
    R: SiteRepository + PeerRepository,
    C: PeerControl,
{
    pub fn new(repo: Arc<R>, control: Arc<C>, config: Arc<WgConfig>) -> Self {
        Self {
            repo,
            control,
            config,
        }
    }

    pub async fn execute(&self, principal: &Principal, input: CreatePeerInput) -> WgResult<Peer> {
        if !principal.is_superadmin {
            return Err(WgError::Forbidden);
        }

        let site = self
            .repo
            .first_site()
            .await?
            .ok_or(WgError::NoSiteConfigured)?;

        // The private key never leaves this scope; it is wiped when the
        // keypair drops. Only the derived public key is persisted.
        let keypair = self.control.generate_keypair().await?;

        let label = non_blank(input.label).unwrap_or_else(|| self.config.default_label.clone());
        let allowed_ips =
            non_blank(input.allowed_ips).unwrap_or_else(|| self.config.default_allowed_ips.clone());

        // Allocate-and-insert: the unique constraint is the arbiter, the
        // retry absorbs concurrent winners.
        let mut inserted = None;
        for attempt in 0..self.config.allocation_attempts {
            let used: HashSet<_> = self
                .repo
                .addresses_for_site(&site.site_id)
                .await?
                .iter()
                .filter_map(|cidr| parse_host(cidr))
                .collect();

            let host = next_host_address(&site.wg_interface_ip, &used)?;

            let candidate = Peer::new(
                site.site_id,
                label.clone(),
                keypair.public_key.clone(),
                host_cidr(host),
                allowed_ips.clone(),
                input.keepalive,
            );

            match self.repo.insert(&candidate).await? {
                InsertOutcome::Inserted => {
                    inserted = Some(candidate);
                    break;
                }
                InsertOutcome::AddressTaken => {
                    tracing::debug!(attempt, address = %candidate.address_cidr, "Address raced, re-allocating");
                }
            }
        }

        let peer = inserted.ok_or_else(|| {
            WgError::Internal("Address allocation kept conflicting with concurrent requests".into())
        })?;

        // Phase two: apply live. The server routes the peer's own /32.
        if let Err(e) = self
            .control
            .add_peer(
                &peer.public_key,
                &peer.address_cidr,
                peer.persistent_keepalive_s.map(|s| s as u16),
            )
            .await
        {
            tracing::error!(
                public_key = %peer.public_key,
                error = %e,
                "Live peer application failed, rolling back desired state"
            );
            if let Err(rollback) = self.repo.delete_by_public_key(&peer.public_key).await {
                tracing::error!(
                    public_key = %peer.public_key,
                    error = %rollback,
                    "Compensating delete failed; desired state is orphaned"
                );
            }
            return Err(e);
        }

        tracing::info!(
            label = %peer.label,
            address = %peer.address_cidr,
            "Peer provisioned"
        );

        Ok(peer)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
