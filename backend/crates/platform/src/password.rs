//! Password Hashing and Verification
//!
//! Argon2id password handling for the login path:
//! - Memory-hard hashing (OWASP recommended parameters)
//! - Zeroization of clear-text material
//! - Constant-time verification
//! - Unicode NFKC normalization before hashing/verifying
//!
//! Verification distinguishes a wrong password from a backend failure so
//! the caller can fail closed and audit the two cases separately.

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prefix every Argon2 PHC string starts with; used as the cheap
/// well-formedness gate on hashes loaded from the datastore.
pub const PHC_ARGON2_PREFIX: &str = "$argon2";

// ============================================================================
// Error Types
// ============================================================================

/// Clear-text password rejection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    /// Password contains only whitespace or is empty
    #[error("Password cannot be empty or contain only whitespace")]
    EmptyOrWhitespace,

    /// Password contains control characters
    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    /// Hashing operation failed
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    /// Invalid hash format
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Password verification errors
///
/// `Mismatch` is the expected failure (wrong password); everything else is
/// a backend fault and must be treated as a rejection, never a pass.
#[derive(Debug, Error)]
pub enum PasswordVerifyError {
    /// The password does not match the stored hash
    #[error("Password mismatch")]
    Mismatch,

    /// The stored hash could not be parsed
    #[error("Invalid password hash format")]
    MalformedHash,

    /// The verification backend failed
    #[error("Password verification failed: {0}")]
    Backend(String),
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password with automatic memory zeroization
///
/// Ensures password data is securely erased from memory when the value is
/// dropped. Does not implement `Clone`; `Debug` output is redacted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Wrap a submitted password.
    ///
    /// Unicode is NFKC-normalized first so the same passphrase verifies
    /// regardless of the client's input method. Empty and control-character
    /// input is rejected. No length or complexity policy is applied here:
    /// this is the verification side, not account creation.
    pub fn new(raw: String) -> Result<Self, PasswordPolicyError> {
        let normalized: String = raw.nfkc().collect();

        if normalized.trim().is_empty() {
            return Err(PasswordPolicyError::EmptyOrWhitespace);
        }

        for ch in normalized.chars() {
            if ch.is_control() && ch != ' ' && ch != '\t' && ch != '\n' {
                return Err(PasswordPolicyError::InvalidCharacter);
            }
        }

        Ok(Self(normalized))
    }

    /// Get the password as bytes for hashing
    pub(crate) fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Hash the password using Argon2id
    ///
    /// ## Arguments
    /// * `pepper` - Optional application-wide secret appended before hashing
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let password_bytes = with_pepper(self.as_bytes(), pepper);

        // Random 128-bit salt per hash
        let salt = SaltString::generate(OsRng);

        // Argon2id with the crate defaults (OWASP recommended: m=19456, t=2, p=1)
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(&password_bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Hashed password in PHC string format
///
/// Stores the Argon2id hash in PHC format (algorithm, version, parameters,
/// salt, hash). Safe to store in the database.
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();

        if !hash.starts_with(PHC_ARGON2_PREFIX) {
            return Err(PasswordHashError::InvalidHashFormat);
        }

        // Validate the full PHC structure
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;

        Ok(Self { hash })
    }

    /// Get the PHC string for storage
    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash
    ///
    /// Argon2 compares digests in constant time internally.
    pub fn verify(
        &self,
        password: &ClearTextPassword,
        pepper: Option<&[u8]>,
    ) -> Result<(), PasswordVerifyError> {
        let password_bytes = with_pepper(password.as_bytes(), pepper);

        let parsed_hash =
            PasswordHash::new(&self.hash).map_err(|_| PasswordVerifyError::MalformedHash)?;

        let argon2 = Argon2::default();

        match argon2.verify_password(&password_bytes, &parsed_hash) {
            Ok(()) => Ok(()),
            Err(argon2::password_hash::Error::Password) => Err(PasswordVerifyError::Mismatch),
            Err(e) => Err(PasswordVerifyError::Backend(e.to_string())),
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

fn with_pepper(password: &[u8], pepper: Option<&[u8]>) -> Vec<u8> {
    match pepper {
        Some(p) => {
            let mut combined = password.to_vec();
            combined.extend_from_slice(p);
            combined
        }
        None => password.to_vec(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_text_validation() {
        assert!(ClearTextPassword::new("correct horse battery".to_string()).is_ok());
        assert!(ClearTextPassword::new("".to_string()).is_err());
        assert!(ClearTextPassword::new("   ".to_string()).is_err());
        assert!(ClearTextPassword::new("abc\u{0007}def".to_string()).is_err());
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = raw.hash(None).unwrap();

        assert!(hashed.verify(&raw, None).is_ok());

        let wrong = ClearTextPassword::new("WrongPassword123!".to_string()).unwrap();
        assert!(matches!(
            hashed.verify(&wrong, None),
            Err(PasswordVerifyError::Mismatch)
        ));
    }

    #[test]
    fn test_hash_with_pepper() {
        let raw = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let pepper = b"app_secret_pepper";
        let hashed = raw.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&raw, Some(pepper)).is_ok());
        assert!(hashed.verify(&raw, None).is_err());
        assert!(hashed.verify(&raw, Some(b"wrong")).is_err());
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let raw = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = raw.hash(None).unwrap();

        let phc = hashed.as_phc_string().to_string();
        assert!(phc.starts_with(PHC_ARGON2_PREFIX));

        let restored = HashedPassword::from_phc_string(phc).unwrap();
        assert!(restored.verify(&raw, None).is_ok());
    }

    #[test]
    fn test_malformed_phc_rejected() {
        assert!(HashedPassword::from_phc_string("").is_err());
        assert!(HashedPassword::from_phc_string("plaintext-password").is_err());
        assert!(HashedPassword::from_phc_string("$2b$12$notargon2").is_err());
        assert!(HashedPassword::from_phc_string("$argon2id$garbage").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let raw = ClearTextPassword::new("SecretPassword123!".to_string()).unwrap();
        let debug = format!("{:?}", raw);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("Secret"));

        let hashed = raw.hash(None).unwrap();
        let debug = format!("{:?}", hashed);
        assert!(debug.contains("HASH"));
    }

    #[test]
    fn test_unicode_normalization() {
        // Same passphrase typed with composed vs decomposed code points
        let composed = ClearTextPassword::new("caf\u{00e9} au lait".to_string()).unwrap();
        let decomposed = ClearTextPassword::new("cafe\u{0301} au lait".to_string()).unwrap();

        let hashed = composed.hash(None).unwrap();
        assert!(hashed.verify(&decomposed, None).is_ok());
    }
}
