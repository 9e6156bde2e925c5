//! Authenticated Principal
//!
//! The identity attached to a request after session enforcement. Handlers
//! receive it through request extensions instead of reaching into ambient
//! request-global state, so authorization checks stay testable without a
//! simulated request environment.

use crate::id::UserId;

/// The authenticated caller of a request.
///
/// Produced by the session-enforcement middleware from a validated session
/// row; carries just enough to make authorization decisions.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Owning user of the session
    pub user_id: UserId,
    /// Username, for logging and display
    pub username: String,
    /// Whether the user may perform peer-administration actions
    pub is_superadmin: bool,
    /// Token of the session this principal was derived from
    pub session_token: String,
}

