//! Login Event Entity
//!
//! One immutable row per authentication attempt. The ledger is append-only:
//! rows are never mutated or deleted, which keeps the lockout decision
//! durable across restarts and out of the client's reach.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

/// Closed set of reason codes recorded with every attempt.
///
/// These drive the ledger and operator diagnostics; none of them leak to
/// the end user, who only ever sees the generic invalid-credentials
/// message (or the lockout notice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginReason {
    /// Successful authentication
    Ok,
    /// Attempt rejected by the brute-force policy
    Locked,
    /// Username unknown or account inactive
    NoUserOrInactive,
    /// Password did not match the stored hash
    BadPassword,
    /// Stored hash was empty or not a recognizable PHC string
    BadStoredHash,
    /// The hash backend failed during verification (failed closed)
    HashVerifyError,
}

impl LoginReason {
    pub const fn as_str(&self) -> &'static str {
        match self {
            LoginReason::Ok => "OK",
            LoginReason::Locked => "LOCKED",
            LoginReason::NoUserOrInactive => "NO_USER_OR_INACTIVE",
            LoginReason::BadPassword => "BAD_PASSWORD",
            LoginReason::BadStoredHash => "BAD_STORED_HASH",
            LoginReason::HashVerifyError => "HASH_VERIFY_ERROR",
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, LoginReason::Ok)
    }
}

impl std::fmt::Display for LoginReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One authentication attempt, successful or not.
///
/// The attempted username is always recorded, even when no such user
/// exists, so unknown-username probes leave the same side effects as any
/// other failure.
#[derive(Debug, Clone)]
pub struct LoginEvent {
    /// Matched user, when one existed
    pub user_id: Option<UserId>,
    /// Username exactly as submitted
    pub username_attempted: String,
    pub success: bool,
    pub reason: LoginReason,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoginEvent {
    pub fn new(
        user_id: Option<UserId>,
        username_attempted: impl Into<String>,
        reason: LoginReason,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            user_id,
            username_attempted: username_attempted.into(),
            success: reason.is_success(),
            reason,
            ip_address,
            user_agent,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        // These strings are persisted; renaming a variant must not change them.
        assert_eq!(LoginReason::Ok.as_str(), "OK");
        assert_eq!(LoginReason::Locked.as_str(), "LOCKED");
        assert_eq!(LoginReason::NoUserOrInactive.as_str(), "NO_USER_OR_INACTIVE");
        assert_eq!(LoginReason::BadPassword.as_str(), "BAD_PASSWORD");
        assert_eq!(LoginReason::BadStoredHash.as_str(), "BAD_STORED_HASH");
        assert_eq!(LoginReason::HashVerifyError.as_str(), "HASH_VERIFY_ERROR");
    }

    #[test]
    fn test_success_flag_follows_reason() {
        let ok = LoginEvent::new(None, "alice", LoginReason::Ok, None, None);
        assert!(ok.success);

        let bad = LoginEvent::new(None, "alice", LoginReason::BadPassword, None, None);
        assert!(!bad.success);
    }

    #[test]
    fn test_unknown_user_still_recorded() {
        let ev = LoginEvent::new(None, "ghost", LoginReason::NoUserOrInactive, None, None);
        assert!(ev.user_id.is_none());
        assert_eq!(ev.username_attempted, "ghost");
    }
}
