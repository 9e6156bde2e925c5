//! Sign Out Use Case
//!
//! Revokes a session. Idempotent: revoking an already-revoked or unknown
//! token succeeds quietly, so logout never fails user-visibly.

use std::sync::Arc;

use crate::domain::repository::SessionRepository;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
}

impl<S> SignOutUseCase<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>) -> Self {
        Self { session_repo }
    }

    /// Revoke the session behind `token`
    pub async fn execute(&self, token: &str) -> AuthResult<()> {
        self.session_repo.revoke(token).await?;

        tracing::info!("User signed out");
        Ok(())
    }
}
