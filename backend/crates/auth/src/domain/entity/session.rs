//! Session Entity
//!
//! The server-side authority for "is this bearer logged in". Sessions are
//! marked revoked on logout or expiry, never hard-deleted, so the audit
//! trail survives.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;

use platform::crypto::random_token;

/// Bytes of entropy behind a session token (256 bits)
const SESSION_TOKEN_BYTES: usize = 32;

/// Why a session failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRejection {
    /// Revoked flag set (logout or an earlier expiry sweep)
    Revoked,
    /// Absolute lifetime exceeded
    AbsoluteExpired,
    /// Idle window exceeded
    IdleExpired,
}

/// Auth session entity
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque high-entropy token; doubles as the primary key
    pub token: String,
    /// Owning user
    pub user_id: UserId,
    /// Issuance time
    pub issued_at: DateTime<Utc>,
    /// Absolute expiry (issued_at + absolute timeout)
    pub expires_at: DateTime<Utc>,
    /// Last time the enforcement middleware saw this session
    pub last_active_at: DateTime<Utc>,
    /// Maximum inactivity before the session dies
    pub idle_timeout_seconds: i64,
    /// Maximum total lifetime regardless of activity
    pub absolute_timeout_seconds: i64,
    /// Revoked sessions are unusable but kept for audit
    pub revoked: bool,
    /// Client IP at issuance
    pub ip_address: Option<String>,
    /// Client User-Agent at issuance
    pub user_agent: Option<String>,
}

impl Session {
    /// Create a new session with a fresh 256-bit token.
    pub fn new(
        user_id: UserId,
        idle_timeout_seconds: i64,
        absolute_timeout_seconds: i64,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        let now = Utc::now();

        Self {
            token: random_token(SESSION_TOKEN_BYTES),
            user_id,
            issued_at: now,
            expires_at: now + Duration::seconds(absolute_timeout_seconds),
            last_active_at: now,
            idle_timeout_seconds,
            absolute_timeout_seconds,
            revoked: false,
            ip_address,
            user_agent,
        }
    }

    /// The session-usability invariant:
    /// `!revoked && now <= expires_at && (now - last_active_at) <= idle`.
    ///
    /// Boundary semantics: still usable at exactly the idle timeout or
    /// exactly the absolute expiry, dead one tick later. The absolute cap
    /// dominates - recent activity never extends a session past
    /// `expires_at`.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), SessionRejection> {
        if self.revoked {
            return Err(SessionRejection::Revoked);
        }
        if now > self.expires_at {
            return Err(SessionRejection::AbsoluteExpired);
        }
        if (now - self.last_active_at) > Duration::seconds(self.idle_timeout_seconds) {
            return Err(SessionRejection::IdleExpired);
        }
        Ok(())
    }

    /// Update the last-activity timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    /// Mark revoked (idempotent)
    pub fn revoke(&mut self) {
        self.revoked = true;
    }
}
