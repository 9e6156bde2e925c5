//! Login Use Case
//!
//! The password step of the credential & MFA state machine:
//! lockout check -> user lookup -> stored-hash sanity -> password
//! verification -> success bookkeeping -> session or pending-MFA ticket.
//!
//! Every attempt, successful or not, lands in the login-event ledger. The
//! three credential failure modes (unknown/inactive user, wrong password,
//! malformed stored hash) are distinguished only there - the caller gets
//! one generic rejection for all of them.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::outcome::LoginOutcome;
use crate::domain::entity::login_event::{LoginEvent, LoginReason};
use crate::domain::entity::session::Session;
use crate::domain::entity::user::User;
use crate::domain::repository::{
    LoginEventRepository, SessionRepository, SettingsRepository, UserRepository,
};
use crate::domain::value_object::lockout::{LOCKOUT_POLICY_KEY, LockoutPolicy};
use crate::domain::value_object::pending_ticket::PendingMfaTicket;
use crate::domain::value_object::user_password::{PasswordCheck, check_password};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

/// Login use case
pub struct LoginUseCase<U, E, S, G>
where
    U: UserRepository,
    E: LoginEventRepository,
    S: SessionRepository,
    G: SettingsRepository,
{
    user_repo: Arc<U>,
    event_repo: Arc<E>,
    session_repo: Arc<S>,
    settings_repo: Arc<G>,
    config: Arc<AuthConfig>,
}

impl<U, E, S, G> LoginUseCase<U, E, S, G>
where
    U: UserRepository,
    E: LoginEventRepository,
    S: SessionRepository,
    G: SettingsRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        event_repo: Arc<E>,
        session_repo: Arc<S>,
        settings_repo: Arc<G>,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            user_repo,
            event_repo,
            session_repo,
            settings_repo,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput, client: ClientInfo) -> AuthResult<LoginOutcome> {
        let policy = self.load_policy().await?;
        let now = Utc::now();

        // Sliding-window lockout, re-evaluated on every attempt. The LOCKED
        // event below is itself a failure, so hammering a locked account
        // keeps the window open.
        let attempts = self
            .event_repo
            .failed_attempts_since(&input.username, policy.window_start(now))
            .await?;

        if policy.locks(attempts.count) {
            let retry_after = policy.retry_after(attempts.last_failure_at.unwrap_or(now));
            self.record(None, &input.username, LoginReason::Locked, &client)
                .await?;
            return Err(AuthError::Locked { retry_after });
        }

        let user = match self.user_repo.find_by_username(&input.username).await? {
            Some(u) if u.can_login() => u,
            other => {
                self.record(
                    other.map(|u| u.user_id),
                    &input.username,
                    LoginReason::NoUserOrInactive,
                    &client,
                )
                .await?;
                // Keep this branch's latency comparable to a real hash
                // verification so response timing does not reveal whether
                // the username exists.
                tokio::time::sleep(self.config.unknown_user_delay).await;
                return Err(AuthError::InvalidCredentials);
            }
        };

        match check_password(&user.password_hash, &input.password, self.config.pepper()) {
            PasswordCheck::Ok => {}
            PasswordCheck::Mismatch => {
                self.record(
                    Some(user.user_id),
                    &input.username,
                    LoginReason::BadPassword,
                    &client,
                )
                .await?;
                return Err(AuthError::InvalidCredentials);
            }
            PasswordCheck::MalformedStored => {
                tracing::error!(username = %user.username, "Stored password hash is malformed");
                self.record(
                    Some(user.user_id),
                    &input.username,
                    LoginReason::BadStoredHash,
                    &client,
                )
                .await?;
                return Err(AuthError::InvalidCredentials);
            }
            PasswordCheck::BackendError(msg) => {
                // Fail closed: a broken verifier must reject, not admit
                tracing::error!(username = %user.username, error = %msg, "Password verification backend failed");
                self.record(
                    Some(user.user_id),
                    &input.username,
                    LoginReason::HashVerifyError,
                    &client,
                )
                .await?;
                return Err(AuthError::InvalidCredentials);
            }
        }

        self.record(Some(user.user_id), &input.username, LoginReason::Ok, &client)
            .await?;

        let mut user = user;
        user.record_login();
        self.user_repo.update(&user).await?;

        if user.mfa_enabled {
            let ticket = PendingMfaTicket::issue(
                user.user_id,
                &user.username,
                self.config.ticket_ttl_chrono(),
            );

            tracing::info!(username = %user.username, "Password verified, TOTP code pending");

            return Ok(LoginOutcome::MfaRequired {
                ticket: ticket.encode(&self.config.ticket_secret),
            });
        }

        let session = self.issue_session(&user, &client).await?;

        tracing::info!(username = %user.username, "User signed in");

        Ok(LoginOutcome::SignedIn {
            session_token: session.token,
        })
    }

    async fn load_policy(&self) -> AuthResult<LockoutPolicy> {
        let raw = self.settings_repo.get(LOCKOUT_POLICY_KEY).await?;
        Ok(LockoutPolicy::from_settings_json(raw.as_deref()))
    }

    async fn record(
        &self,
        user_id: Option<kernel::id::UserId>,
        username: &str,
        reason: LoginReason,
        client: &ClientInfo,
    ) -> AuthResult<()> {
        let event = LoginEvent::new(
            user_id,
            username,
            reason,
            client.ip_string(),
            client.user_agent.clone(),
        );
        self.event_repo.record(&event).await
    }

    async fn issue_session(&self, user: &User, client: &ClientInfo) -> AuthResult<Session> {
        let session = Session::new(
            user.user_id,
            self.config.idle_timeout_seconds(),
            self.config.absolute_timeout_seconds(),
            client.ip_string(),
            client.user_agent.clone(),
        );
        self.session_repo.create(&session).await?;
        Ok(session)
    }
}
