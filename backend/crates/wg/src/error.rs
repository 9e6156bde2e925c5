//! WireGuard Provisioning Error Types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// WG-specific result type alias
pub type WgResult<T> = Result<T, WgError>;

/// WG-specific error variants
#[derive(Debug, Error)]
pub enum WgError {
    /// Caller is not a superadmin
    #[error("Administrator privileges required")]
    Forbidden,

    /// No site row exists to allocate from
    #[error("No site configured")]
    NoSiteConfigured,

    /// The site's subnet could not be parsed or is not IPv4
    #[error("Invalid site subnet: {0}")]
    InvalidSubnet(String),

    /// Every host address in the site's subnet is taken
    #[error("No free addresses left in the pool")]
    PoolExhausted,

    /// The control-surface command exited non-zero; carries the combined
    /// stderr/stdout diagnostic text
    #[error("wg control error: {0}")]
    ControlSurface(String),

    /// The control-surface command exceeded its timeout and was killed
    #[error("wg control timed out after {elapsed_ms} ms")]
    ControlTimeout { elapsed_ms: u64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WgError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            WgError::Forbidden => StatusCode::FORBIDDEN,
            WgError::NoSiteConfigured | WgError::InvalidSubnet(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            WgError::PoolExhausted => StatusCode::CONFLICT,
            WgError::ControlSurface(_) => StatusCode::BAD_GATEWAY,
            WgError::ControlTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            WgError::Database(_) | WgError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            WgError::Forbidden => ErrorKind::Forbidden,
            WgError::PoolExhausted => ErrorKind::Conflict,
            WgError::ControlSurface(_) => ErrorKind::ServiceUnavailable,
            WgError::ControlTimeout { .. } => ErrorKind::RequestTimeout,
            WgError::NoSiteConfigured
            | WgError::InvalidSubnet(_)
            | WgError::Database(_)
            | WgError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            WgError::Database(e) => {
                tracing::error!(error = %e, "WG database error");
            }
            WgError::ControlSurface(diag) => {
                tracing::error!(diagnostic = %diag, "wg control surface failed");
            }
            WgError::ControlTimeout { elapsed_ms } => {
                tracing::error!(elapsed_ms, "wg control surface timed out");
            }
            WgError::Forbidden => {
                tracing::warn!("Non-admin attempted peer administration");
            }
            _ => {
                tracing::debug!(error = %self, "WG error");
            }
        }
    }
}

impl IntoResponse for WgError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}
