//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in the
//! infrastructure layer; the scenario tests drive the use cases through
//! in-memory fakes of these traits.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::entity::{login_event::LoginEvent, session::Session, user::User};
use crate::error::AuthResult;

/// Failed-attempt summary for one username inside the lockout window
#[derive(Debug, Clone, Copy, Default)]
pub struct FailedAttempts {
    /// Number of failed attempts since the window start
    pub count: i64,
    /// Most recent failure inside the window, if any
    pub last_failure_at: Option<DateTime<Utc>>,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Find user by username (exact match)
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Update user (last-login, MFA fields)
    async fn update(&self, user: &User) -> AuthResult<()>;
}

/// Login-event ledger trait. Append-only: there is deliberately no update
/// or delete operation.
#[trait_variant::make(LoginEventRepository: Send)]
pub trait LocalLoginEventRepository {
    /// Append one attempt record
    async fn record(&self, event: &LoginEvent) -> AuthResult<()>;

    /// Count failed attempts for a username since `since`
    async fn failed_attempts_since(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> AuthResult<FailedAttempts>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    /// Insert a new session
    async fn create(&self, session: &Session) -> AuthResult<()>;

    /// Find session by token
    async fn find_by_token(&self, token: &str) -> AuthResult<Option<Session>>;

    /// Update last-active timestamp
    async fn touch(&self, token: &str, at: DateTime<Utc>) -> AuthResult<()>;

    /// Mark revoked; a no-op on missing or already-revoked tokens
    async fn revoke(&self, token: &str) -> AuthResult<()>;

    /// Hard-delete sessions whose absolute expiry passed before `cutoff`
    /// (startup hygiene, not part of the enforcement path)
    async fn purge_expired_before(&self, cutoff: DateTime<Utc>) -> AuthResult<u64>;
}

/// Settings store trait (JSON policy blobs)
#[trait_variant::make(SettingsRepository: Send)]
pub trait LocalSettingsRepository {
    /// Fetch a raw setting value by key
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;
}
