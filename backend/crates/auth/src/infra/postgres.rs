//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use kernel::id::UserId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{login_event::LoginEvent, session::Session, user::User};
use crate::domain::repository::{
    FailedAttempts, LoginEventRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::error::AuthResult;

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    mfa_enabled: bool,
    mfa_secret: Option<String>,
    is_active: bool,
    is_superadmin: bool,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        User {
            user_id: UserId::from_uuid(self.id),
            username: self.username,
            password_hash: self.password_hash,
            mfa_enabled: self.mfa_enabled,
            mfa_secret: self.mfa_secret,
            is_active: self.is_active,
            is_superadmin: self.is_superadmin,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    last_active_at: DateTime<Utc>,
    idle_timeout_seconds: i64,
    absolute_timeout_seconds: i64,
    revoked: bool,
    ip_address: Option<String>,
    user_agent: Option<String>,
}

impl SessionRow {
    fn into_session(self) -> Session {
        Session {
            token: self.id,
            user_id: UserId::from_uuid(self.user_id),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
            last_active_at: self.last_active_at,
            idle_timeout_seconds: self.idle_timeout_seconds,
            absolute_timeout_seconds: self.absolute_timeout_seconds,
            revoked: self.revoked,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        }
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                username,
                password_hash,
                mfa_enabled,
                mfa_secret,
                is_active,
                is_superadmin,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT
                id,
                username,
                password_hash,
                mfa_enabled,
                mfa_secret,
                is_active,
                is_superadmin,
                last_login_at,
                created_at,
                updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_user()))
    }

    async fn update(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                mfa_enabled = $2,
                mfa_secret = $3,
                is_active = $4,
                is_superadmin = $5,
                last_login_at = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.mfa_enabled)
        .bind(&user.mfa_secret)
        .bind(user.is_active)
        .bind(user.is_superadmin)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// ============================================================================
// Login-Event Ledger Implementation
// ============================================================================

impl LoginEventRepository for PgAuthRepository {
    async fn record(&self, event: &LoginEvent) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO login_events (
                user_id,
                username_attempted,
                success,
                reason,
                ip_address,
                user_agent,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.user_id.map(|id| *id.as_uuid()))
        .bind(&event.username_attempted)
        .bind(event.success)
        .bind(event.reason.as_str())
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(event.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn failed_attempts_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> AuthResult<FailedAttempts> {
        let (count, last_failure_at) = sqlx::query_as::<_, (i64, Option<DateTime<Utc>>)>(
            r#"
            SELECT COUNT(*), MAX(created_at)
            FROM login_events
            WHERE username_attempted = $1
              AND success = FALSE
              AND created_at >= $2
            "#,
        )
        .bind(username)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(FailedAttempts {
            count,
            last_failure_at,
        })
    }
}

// ============================================================================
// Session Repository Implementation
// ============================================================================

impl SessionRepository for PgAuthRepository {
    async fn create(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id,
                user_id,
                issued_at,
                expires_at,
                last_active_at,
                idle_timeout_seconds,
                absolute_timeout_seconds,
                revoked,
                ip_address,
                user_agent
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id.as_uuid())
        .bind(session.issued_at)
        .bind(session.expires_at)
        .bind(session.last_active_at)
        .bind(session.idle_timeout_seconds)
        .bind(session.absolute_timeout_seconds)
        .bind(session.revoked)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> AuthResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                id,
                user_id,
                issued_at,
                expires_at,
                last_active_at,
                idle_timeout_seconds,
                absolute_timeout_seconds,
                revoked,
                ip_address,
                user_agent
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_session()))
    }

    async fn touch(&self, token: &str, at: DateTime<Utc>) -> AuthResult<()> {
        sqlx::query("UPDATE sessions SET last_active_at = $2 WHERE id = $1")
            .bind(token)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn revoke(&self, token: &str) -> AuthResult<()> {
        // Idempotent on already-revoked and missing tokens
        sqlx::query("UPDATE sessions SET revoked = TRUE WHERE id = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn purge_expired_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM sessions WHERE expires_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Purged dead sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Settings Repository Implementation
// ============================================================================

impl SettingsRepository for PgAuthRepository {
    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT v FROM settings WHERE k = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }
}
