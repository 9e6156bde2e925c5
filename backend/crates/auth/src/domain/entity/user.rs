//! User Entity
//!
//! The portal's identity record. Users are provisioned out of band and are
//! never deleted by this crate; the state machine only touches the MFA
//! fields and the last-login timestamp.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Username (unique, for login and display)
    pub username: String,
    /// Argon2id PHC string. Well-formedness is checked at login time; a
    /// malformed value fails closed as invalid credentials.
    pub password_hash: String,
    /// Whether MFA has been confirmed and is enforced at login
    pub mfa_enabled: bool,
    /// Base32 TOTP secret. Present but disabled while enrollment is pending.
    pub mfa_secret: Option<String>,
    /// Inactive users cannot log in
    pub is_active: bool,
    /// May manage VPN peers
    pub is_superadmin: bool,
    /// Last successful login time
    pub last_login_at: Option<DateTime<Utc>>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    /// Check if user can log in
    pub fn can_login(&self) -> bool {
        self.is_active
    }

    /// Begin MFA enrollment with a freshly generated secret.
    ///
    /// The secret is stored disabled; it only becomes authoritative once
    /// [`User::enable_mfa`] runs after a successful code confirmation.
    /// Calling this when a pending secret already exists is a bug - the
    /// pending secret must be re-presented, not rotated.
    pub fn set_pending_mfa_secret(&mut self, secret_base32: String) {
        debug_assert!(!self.mfa_enabled);
        self.mfa_secret = Some(secret_base32);
        self.updated_at = Utc::now();
    }

    /// Flip MFA on after the pending secret was confirmed
    pub fn enable_mfa(&mut self) {
        if self.mfa_secret.is_some() {
            self.mfa_enabled = true;
            self.updated_at = Utc::now();
        }
    }

    /// Disable MFA, clearing the secret with the flag.
    ///
    /// A disabled state never retains the old secret value.
    pub fn disable_mfa(&mut self) {
        self.mfa_enabled = false;
        self.mfa_secret = None;
        self.updated_at = Utc::now();
    }
}
