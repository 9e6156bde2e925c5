//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, middleware, router
//!
//! ## Features
//! - Username + password login with brute-force lockout
//! - TOTP-based MFA (Google Authenticator compatible), observe-then-confirm
//!   enrollment
//! - Signed, stateless pending-MFA ticket between the password and TOTP steps
//! - Server-side sessions with idle and absolute expiry, cookie-based tokens
//! - Append-only login-event ledger driving the lockout decision
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Unknown-user, wrong-password and malformed-hash failures are
//!   indistinguishable to the caller (anti-enumeration)
//! - Lockout is a sliding window over the ledger, re-evaluated every attempt
//! - Sessions are revoked, never hard-deleted, on logout or expiry

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgAuthRepository;
pub use presentation::router::{auth_router, with_session_guard};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
