//! Check Session Use Case
//!
//! The enforcement policy behind every protected request: look the token
//! up, apply the usability invariant, revoke on expiry, touch the
//! last-activity timestamp, and hand back the caller's principal.

use std::sync::Arc;

use chrono::Utc;
use kernel::principal::Principal;

use crate::domain::entity::session::SessionRejection;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::{AuthError, AuthResult};

/// Check session use case
pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository + Clone + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>) -> Self {
        Self {
            user_repo,
            session_repo,
        }
    }

    /// Enforce the session policy for `token` and produce the principal.
    ///
    /// Expired sessions (absolute first, then idle) are revoked on the way
    /// out. A valid session gets its `last_active_at` touched; the write
    /// is fire-and-forget since two concurrent touches both write "now"
    /// and last-write-wins is harmless.
    pub async fn enforce(&self, token: &str) -> AuthResult<Principal> {
        let session = self
            .session_repo
            .find_by_token(token)
            .await?
            .ok_or(AuthError::SessionInvalid)?;

        let now = Utc::now();
        match session.check_usable(now) {
            Ok(()) => {}
            Err(SessionRejection::Revoked) => return Err(AuthError::SessionInvalid),
            Err(SessionRejection::AbsoluteExpired) | Err(SessionRejection::IdleExpired) => {
                self.session_repo.revoke(token).await?;
                return Err(AuthError::SessionInvalid);
            }
        }

        {
            let repo = Arc::clone(&self.session_repo);
            let token = token.to_string();
            tokio::spawn(async move {
                if let Err(e) = repo.touch(&token, now).await {
                    tracing::warn!(error = %e, "Failed to update session activity");
                }
            });
        }

        // The user behind the session must still exist and be active
        let user = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .filter(|u| u.can_login())
            .ok_or(AuthError::SessionInvalid)?;

        Ok(Principal {
            user_id: user.user_id,
            username: user.username,
            is_superadmin: user.is_superadmin,
            session_token: token.to_string(),
        })
    }
}
