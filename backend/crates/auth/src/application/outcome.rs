//! Tagged Use-Case Outcomes
//!
//! The state machine hands the presentation layer a value describing what
//! to do (where to redirect, which cookies to set or clear) instead of a
//! rendered response, so the whole flow is testable without HTTP.

/// Redirect targets used by the login flows
pub mod redirect {
    /// Authenticated landing page
    pub const HOME: &str = "/";
    /// Login form
    pub const LOGIN: &str = "/login";
    /// MFA verification step
    pub const MFA: &str = "/mfa";
}

/// Outcome of the password step
#[derive(Debug)]
pub enum LoginOutcome {
    /// Fully authenticated: set the session cookie, go home
    SignedIn {
        /// Opaque session token for the cookie
        session_token: String,
    },
    /// Password accepted but a TOTP code is owed: set the ticket cookie,
    /// go to the MFA step. No session exists yet.
    MfaRequired {
        /// Encoded pending-MFA ticket for the cookie
        ticket: String,
    },
}

impl LoginOutcome {
    /// Where the client should navigate next
    pub fn redirect_to(&self) -> &'static str {
        match self {
            LoginOutcome::SignedIn { .. } => redirect::HOME,
            LoginOutcome::MfaRequired { .. } => redirect::MFA,
        }
    }
}

/// Outcome of the MFA verification step
#[derive(Debug)]
pub enum MfaOutcome {
    /// Code accepted: set the session cookie, clear the ticket, go home
    SignedIn { session_token: String },
    /// Ticket missing/expired/invalid, or the user lost their secret in
    /// the meantime: clear the ticket, back to the login form
    BackToLogin,
}

impl MfaOutcome {
    pub fn redirect_to(&self) -> &'static str {
        match self {
            MfaOutcome::SignedIn { .. } => redirect::HOME,
            MfaOutcome::BackToLogin => redirect::LOGIN,
        }
    }
}

/// Provisioning material shown during enrollment
#[derive(Debug, Clone)]
pub struct ProvisioningData {
    /// Base32 secret for manual entry
    pub secret_base32: String,
    /// otpauth:// URI
    pub otpauth_url: String,
    /// QR code as base64-encoded PNG
    pub qr_png_base64: String,
}

/// View data for the enrollment page
#[derive(Debug)]
pub enum EnrollView {
    /// MFA already confirmed; re-visiting the page changes nothing
    AlreadyEnabled,
    /// A pending (not yet trusted) secret awaiting confirmation
    Pending(ProvisioningData),
}

/// Outcome of submitting a confirmation code during enrollment
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Code matched the pending secret; MFA is now enforced
    Enabled,
    /// Wrong code. The same provisioning material is shown again - the
    /// pending secret is not rotated on a failed confirmation.
    Rejected(ProvisioningData),
}
