//! Application Configuration
//!
//! Configuration for the Auth application layer. The ticket signing key,
//! TTLs and cookie attributes are all explicit here rather than buried in
//! defaults.

use std::time::Duration;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Session cookie name
    pub session_cookie_name: String,
    /// Pending-MFA ticket cookie name
    pub ticket_cookie_name: String,
    /// HMAC key for the pending-MFA ticket signature (32 bytes)
    pub ticket_secret: [u8; 32],
    /// Pending-MFA ticket validity window
    pub ticket_ttl: Duration,
    /// Session idle timeout (25 minutes)
    pub session_idle_timeout: Duration,
    /// Session absolute timeout (30 minutes). Not cross-validated against
    /// the idle timeout; absolute <= idle is a degenerate but permitted
    /// configuration.
    pub session_absolute_timeout: Duration,
    /// Whether to require Secure cookie
    pub cookie_secure: bool,
    /// SameSite policy
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Issuer shown in authenticator apps and the otpauth URI
    pub totp_issuer: String,
    /// Minimum response delay applied on the unknown-user branch so its
    /// latency is comparable to a full hash verification
    pub unknown_user_delay: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "portal_session".to_string(),
            ticket_cookie_name: "mfa_ticket".to_string(),
            ticket_secret: [0u8; 32],
            ticket_ttl: Duration::from_secs(600),
            session_idle_timeout: Duration::from_secs(1500),
            session_absolute_timeout: Duration::from_secs(1800),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
            totp_issuer: "VPN Portal".to_string(),
            unknown_user_delay: Duration::from_millis(250),
        }
    }
}

impl AuthConfig {
    /// Create config with a random ticket secret (for development)
    pub fn with_random_secret() -> Self {
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&platform::crypto::random_bytes(32));
        Self {
            ticket_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secret()
        }
    }

    /// Session idle timeout in whole seconds
    pub fn idle_timeout_seconds(&self) -> i64 {
        self.session_idle_timeout.as_secs() as i64
    }

    /// Session absolute timeout in whole seconds
    pub fn absolute_timeout_seconds(&self) -> i64 {
        self.session_absolute_timeout.as_secs() as i64
    }

    /// Ticket TTL as a chrono duration
    pub fn ticket_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ticket_ttl.as_secs() as i64)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
