//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
///
/// Unknown user, wrong password and malformed stored hash all collapse into
/// [`AuthError::InvalidCredentials`] before leaving the crate; the ledger
/// keeps the distinction, the caller must not.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (unknown user, inactive user, wrong password,
    /// malformed stored hash - rendered identically)
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account is locked by the brute-force policy
    #[error("Too many failed login attempts")]
    Locked {
        /// When the caller may reasonably retry (display-only)
        retry_after: DateTime<Utc>,
    },

    /// Wrong, replayed or out-of-window TOTP code
    #[error("Invalid authentication code")]
    InvalidMfaCode,

    /// Session not found, revoked or expired
    #[error("Session not found or expired")]
    SessionInvalid,

    /// MFA operation on a user without a pending or enrolled secret
    #[error("Two-factor authentication is not set up")]
    MfaNotEnrolled,

    /// Caller may not act on the target (e.g. disabling another user's MFA)
    #[error("Forbidden")]
    Forbidden,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Locked { .. } => StatusCode::TOO_MANY_REQUESTS,
            AuthError::InvalidMfaCode | AuthError::SessionInvalid => StatusCode::UNAUTHORIZED,
            AuthError::MfaNotEnrolled => StatusCode::BAD_REQUEST,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::InvalidCredentials
            | AuthError::InvalidMfaCode
            | AuthError::SessionInvalid => ErrorKind::Unauthorized,
            AuthError::Locked { .. } => ErrorKind::TooManyRequests,
            AuthError::MfaNotEnrolled => ErrorKind::BadRequest,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let err = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::Locked { retry_after } => err.with_action(format!(
                "Try again after {}",
                retry_after.format("%Y-%m-%d %H:%M:%S UTC")
            )),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::Locked { retry_after } => {
                tracing::warn!(retry_after = %retry_after, "Login attempt on locked account");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
