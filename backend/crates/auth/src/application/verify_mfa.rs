//! Verify MFA Use Case
//!
//! Consumes the pending-MFA ticket minted by the password step. An
//! invalid or expired ticket sends the caller back to the login form; a
//! wrong code is a retryable rejection that leaves the ticket alone, so
//! the user can try again until the ticket TTL runs out.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::outcome::MfaOutcome;
use crate::domain::entity::session::Session;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::pending_ticket::PendingMfaTicket;
use crate::domain::value_object::totp_secret::{TotpSecret, normalize_code};
use crate::error::{AuthError, AuthResult};

/// Verify MFA use case
pub struct VerifyMfaUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AuthConfig>,
}

impl<U, S> VerifyMfaUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AuthConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        ticket_cookie: Option<&str>,
        submitted_code: &str,
        client: ClientInfo,
    ) -> AuthResult<MfaOutcome> {
        let Some(raw_ticket) = ticket_cookie else {
            return Ok(MfaOutcome::BackToLogin);
        };

        let ticket =
            match PendingMfaTicket::decode(raw_ticket, &self.config.ticket_secret, Utc::now()) {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(error = %e, "Rejected pending-MFA ticket");
                    return Ok(MfaOutcome::BackToLogin);
                }
            };

        // A ticket for a vanished, deactivated or secret-less user carries
        // no authority: treat the caller as anonymous.
        let user = match self.user_repo.find_by_id(&ticket.user_id).await? {
            Some(u) if u.can_login() => u,
            _ => return Ok(MfaOutcome::BackToLogin),
        };
        let Some(secret_base32) = user.mfa_secret.clone() else {
            return Ok(MfaOutcome::BackToLogin);
        };

        let secret = TotpSecret::from_base32(secret_base32)?;
        let code = normalize_code(submitted_code);

        if !secret.verify_now(&code, &self.config.totp_issuer, &user.username)? {
            // The ticket is not consumed; retries are bounded by its TTL
            return Err(AuthError::InvalidMfaCode);
        }

        let session = Session::new(
            user.user_id,
            self.config.idle_timeout_seconds(),
            self.config.absolute_timeout_seconds(),
            client.ip_string(),
            client.user_agent.clone(),
        );
        self.session_repo.create(&session).await?;

        tracing::info!(username = %user.username, "TOTP code verified, session issued");

        Ok(MfaOutcome::SignedIn {
            session_token: session.token,
        })
    }
}
