//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::{PeerId, SiteId, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{Peer, PeerListing, Site};
use crate::domain::repository::{InsertOutcome, PeerRepository, SiteRepository};
use crate::error::WgResult;

/// PostgreSQL-backed provisioning repository
#[derive(Clone)]
pub struct PgWgRepository {
    pool: PgPool,
}

impl PgWgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct PeerRow {
    id: Uuid,
    site_id: Uuid,
    user_id: Option<Uuid>,
    label: String,
    public_key: String,
    preshared_key: Option<String>,
    address_cidr: String,
    allowed_ips: String,
    dns_servers: Option<String>,
    persistent_keepalive_s: Option<i32>,
    enabled: bool,
    created_at: DateTime<Utc>,
    /// Owner's username when joined; absent on plain selects
    #[sqlx(default)]
    owner_username: Option<String>,
}

impl PeerRow {
    fn into_peer(self) -> Peer {
        Peer {
            peer_id: PeerId::from_uuid(self.id),
            site_id: SiteId::from_uuid(self.site_id),
            user_id: self.user_id.map(UserId::from_uuid),
            label: self.label,
            public_key: self.public_key,
            preshared_key: self.preshared_key,
            address_cidr: self.address_cidr,
            allowed_ips: self.allowed_ips,
            dns_servers: self.dns_servers,
            persistent_keepalive_s: self.persistent_keepalive_s,
            enabled: self.enabled,
            created_at: self.created_at,
        }
    }

    fn into_listing(self) -> PeerListing {
        let owner_username = self.owner_username.clone();
        PeerListing {
            peer: self.into_peer(),
            owner_username,
        }
    }
}

// ============================================================================
// Site Repository Implementation
// ============================================================================

impl SiteRepository for PgWgRepository {
    async fn first_site(&self) -> WgResult<Option<Site>> {
        let row = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT id, wg_interface_ip FROM sites ORDER BY id ASC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, wg_interface_ip)| Site {
            site_id: SiteId::from_uuid(id),
            wg_interface_ip,
        }))
    }
}

// ============================================================================
// Peer Repository Implementation
// ============================================================================

impl PeerRepository for PgWgRepository {
    async fn insert(&self, peer: &Peer) -> WgResult<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO peers (
                id,
                site_id,
                user_id,
                label,
                public_key,
                preshared_key,
                address_cidr,
                allowed_ips,
                dns_servers,
                persistent_keepalive_s,
                enabled,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(peer.peer_id.as_uuid())
        .bind(peer.site_id.as_uuid())
        .bind(peer.user_id.map(|id| *id.as_uuid()))
        .bind(&peer.label)
        .bind(&peer.public_key)
        .bind(&peer.preshared_key)
        .bind(&peer.address_cidr)
        .bind(&peer.allowed_ips)
        .bind(&peer.dns_servers)
        .bind(peer.persistent_keepalive_s)
        .bind(peer.enabled)
        .bind(peer.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Ok(InsertOutcome::AddressTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_all(&self) -> WgResult<Vec<PeerListing>> {
        let rows = sqlx::query_as::<_, PeerRow>(
            r#"
            SELECT
                p.id,
                p.site_id,
                p.user_id,
                p.label,
                p.public_key,
                p.preshared_key,
                p.address_cidr,
                p.allowed_ips,
                p.dns_servers,
                p.persistent_keepalive_s,
                p.enabled,
                p.created_at,
                u.username AS owner_username
            FROM peers p
            LEFT JOIN users u ON p.user_id = u.id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_listing()).collect())
    }

    async fn addresses_for_site(&self, site_id: &SiteId) -> WgResult<Vec<String>> {
        let addresses =
            sqlx::query_scalar::<_, String>("SELECT address_cidr FROM peers WHERE site_id = $1")
                .bind(site_id.as_uuid())
                .fetch_all(&self.pool)
                .await?;

        Ok(addresses)
    }

    async fn find_by_id(&self, peer_id: &PeerId) -> WgResult<Option<Peer>> {
        let row = sqlx::query_as::<_, PeerRow>(
            r#"
            SELECT
                id,
                site_id,
                user_id,
                label,
                public_key,
                preshared_key,
                address_cidr,
                allowed_ips,
                dns_servers,
                persistent_keepalive_s,
                enabled,
                created_at
            FROM peers
            WHERE id = $1
            "#,
        )
        .bind(peer_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_peer()))
    }

    async fn delete_by_id(&self, peer_id: &PeerId) -> WgResult<()> {
        sqlx::query("DELETE FROM peers WHERE id = $1")
            .bind(peer_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn delete_by_public_key(&self, public_key: &str) -> WgResult<()> {
        sqlx::query("DELETE FROM peers WHERE public_key = $1")
            .bind(public_key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
