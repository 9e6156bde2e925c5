//! MFA Enrollment Use Case
//!
//! Observe-then-confirm enrollment for an already-authenticated user:
//! the secret is generated and persisted *disabled*, shown for a QR scan,
//! and only trusted once the user proves they can produce a code from it.
//! A failed confirmation re-presents the same secret - rotation here would
//! strand a user whose authenticator already holds the first one.

use std::sync::Arc;

use kernel::id::UserId;
use kernel::principal::Principal;

use crate::application::config::AuthConfig;
use crate::application::outcome::{ConfirmOutcome, EnrollView, ProvisioningData};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::totp_secret::{TotpSecret, normalize_code};
use crate::error::{AuthError, AuthResult};

/// MFA enrollment use case
pub struct EnrollMfaUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
    config: Arc<AuthConfig>,
}

impl<U> EnrollMfaUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>, config: Arc<AuthConfig>) -> Self {
        Self { user_repo, config }
    }

    /// Present the enrollment state.
    ///
    /// Idempotent for enrolled users: this path never regenerates or
    /// invalidates a confirmed secret. For everyone else it ensures a
    /// pending secret exists and returns its provisioning material.
    pub async fn enroll(&self, principal: &Principal) -> AuthResult<EnrollView> {
        let user = self.load_user(&principal.user_id).await?;

        if user.mfa_enabled {
            return Ok(EnrollView::AlreadyEnabled);
        }

        let secret = match &user.mfa_secret {
            Some(stored) => TotpSecret::from_base32(stored.clone())?,
            None => {
                let secret = TotpSecret::generate();
                let mut user = user.clone();
                user.set_pending_mfa_secret(secret.as_base32().to_string());
                self.user_repo.update(&user).await?;

                tracing::info!(username = %user.username, "MFA enrollment started");
                secret
            }
        };

        Ok(EnrollView::Pending(
            self.provisioning(&secret, &user.username)?,
        ))
    }

    /// Confirm the pending secret with a submitted code; on success the
    /// enabled flag flips in the same update that keeps the secret.
    pub async fn confirm(&self, principal: &Principal, submitted_code: &str) -> AuthResult<ConfirmOutcome> {
        let mut user = self.load_user(&principal.user_id).await?;

        if user.mfa_enabled {
            return Ok(ConfirmOutcome::Enabled);
        }

        let Some(stored) = user.mfa_secret.clone() else {
            return Err(AuthError::MfaNotEnrolled);
        };
        let secret = TotpSecret::from_base32(stored)?;

        let code = normalize_code(submitted_code);
        if !secret.verify_now(&code, &self.config.totp_issuer, &user.username)? {
            return Ok(ConfirmOutcome::Rejected(
                self.provisioning(&secret, &user.username)?,
            ));
        }

        user.enable_mfa();
        self.user_repo.update(&user).await?;

        tracing::info!(username = %user.username, "MFA enabled");

        Ok(ConfirmOutcome::Enabled)
    }

    /// Disable MFA. Users may only disable their own; the flag and the
    /// secret are cleared together.
    pub async fn disable(&self, principal: &Principal, target_user_id: &UserId) -> AuthResult<()> {
        if target_user_id != &principal.user_id {
            return Err(AuthError::Forbidden);
        }

        let mut user = self.load_user(&principal.user_id).await?;
        user.disable_mfa();
        self.user_repo.update(&user).await?;

        tracing::info!(username = %user.username, "MFA disabled");

        Ok(())
    }

    async fn load_user(&self, user_id: &UserId) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| u.can_login())
            .ok_or(AuthError::SessionInvalid)
    }

    fn provisioning(&self, secret: &TotpSecret, username: &str) -> AuthResult<ProvisioningData> {
        Ok(ProvisioningData {
            secret_base32: secret.as_base32().to_string(),
            otpauth_url: secret.otpauth_url(&self.config.totp_issuer, username)?,
            qr_png_base64: secret.qr_png_base64(&self.config.totp_issuer, username)?,
        })
    }
}
