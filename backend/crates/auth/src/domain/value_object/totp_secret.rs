//! TOTP Secret Value Object
//!
//! Wraps an RFC 6238 TOTP secret for multi-factor authentication.
//! Uses Google Authenticator compatible settings: SHA-1, 6 digits,
//! 30 second period.

use kernel::error::app_error::{AppError, AppResult};
use totp_rs::{Algorithm, Secret, TOTP};

/// TOTP configuration constants
const TOTP_DIGITS: usize = 6;
const TOTP_STEP: u64 = 30;

/// Normalize a submitted code the way users type them: surrounding
/// whitespace and inner grouping spaces removed.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().replace(' ', "")
}

/// Cheap gate applied before any HMAC work: authenticator codes are 6-7
/// decimal digits. Anything else is rejected outright.
pub fn is_plausible_code(code: &str) -> bool {
    (6..=7).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_digit())
}

/// TOTP secret for multi-factor authentication
///
/// `Debug` is redacted; the base32 value must never reach a log line.
#[derive(Clone)]
pub struct TotpSecret {
    /// Base32-encoded secret
    secret_base32: String,
}

impl TotpSecret {
    /// Generate a new random 20-byte (160-bit) secret
    pub fn generate() -> Self {
        let secret = Secret::generate_secret();
        Self {
            secret_base32: secret.to_encoded().to_string(),
        }
    }

    /// Create from a base32-encoded string (from database)
    pub fn from_base32(secret: impl Into<String>) -> AppResult<Self> {
        let secret_str = secret.into();
        // Validate by trying to decode
        Secret::Encoded(secret_str.clone())
            .to_bytes()
            .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?;

        Ok(Self {
            secret_base32: secret_str,
        })
    }

    /// Get the base32-encoded secret for storage
    pub fn as_base32(&self) -> &str {
        &self.secret_base32
    }

    /// Create a TOTP instance with the given drift window (skew).
    fn to_totp(&self, window: u8, issuer: &str, account_name: &str) -> AppResult<TOTP> {
        let secret = Secret::Encoded(self.secret_base32.clone());

        TOTP::new(
            Algorithm::SHA1,
            TOTP_DIGITS,
            window,
            TOTP_STEP,
            secret
                .to_bytes()
                .map_err(|e| AppError::internal(format!("Invalid TOTP secret: {:?}", e)))?,
            Some(issuer.to_string()),
            account_name.to_string(),
        )
        .map_err(|e| AppError::internal(format!("Failed to create TOTP: {}", e)))
    }

    /// Verify a code at an explicit Unix timestamp.
    ///
    /// `window` counts accepted 30-second steps either side of the current
    /// one, so `window = 1` tolerates up to ±30 s of clock drift. Non-digit
    /// or wrong-length input is rejected before any HMAC is computed.
    pub fn verify_at(
        &self,
        code: &str,
        at_unix: u64,
        window: u8,
        issuer: &str,
        account_name: &str,
    ) -> AppResult<bool> {
        if !is_plausible_code(code) {
            return Ok(false);
        }
        let totp = self.to_totp(window, issuer, account_name)?;
        Ok(totp.check(code, at_unix))
    }

    /// Verify a code against the current clock with the standard ±1 step
    /// window.
    pub fn verify_now(&self, code: &str, issuer: &str, account_name: &str) -> AppResult<bool> {
        if !is_plausible_code(code) {
            return Ok(false);
        }
        let totp = self.to_totp(1, issuer, account_name)?;
        Ok(totp.check_current(code).unwrap_or(false))
    }

    /// The valid code at an explicit Unix timestamp (tests and fixtures)
    pub fn code_at(&self, at_unix: u64, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(0, issuer, account_name)?;
        Ok(totp.generate(at_unix))
    }

    /// The `otpauth://totp/...` provisioning URI for QR rendering or
    /// manual entry. Carries the full parameter set (secret, issuer,
    /// algorithm, digits, period) that authenticator apps accept.
    pub fn otpauth_url(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let label = percent_encode(&format!("{issuer}:{account_name}"));
        Ok(format!(
            "otpauth://totp/{label}?secret={secret}&issuer={issuer}&algorithm=SHA1&digits={digits}&period={period}",
            secret = self.secret_base32,
            issuer = percent_encode(issuer),
            digits = TOTP_DIGITS,
            period = TOTP_STEP,
        ))
    }

    /// Provisioning QR code as base64-encoded PNG
    pub fn qr_png_base64(&self, issuer: &str, account_name: &str) -> AppResult<String> {
        let totp = self.to_totp(1, issuer, account_name)?;
        totp.get_qr_base64()
            .map_err(|e| AppError::internal(format!("Failed to generate QR code: {}", e)))
    }
}

/// RFC 3986 percent-encoding of everything outside the unreserved set
fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

impl std::fmt::Debug for TotpSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpSecret")
            .field("secret_base32", &"[REDACTED]")
            .finish()
    }
}
