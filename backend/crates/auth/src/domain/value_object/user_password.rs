//! Stored Password Checking
//!
//! Maps the platform's Argon2id primitives onto the login flow's closed
//! set of outcomes. The distinction between a malformed stored hash, a
//! mismatch and a backend failure feeds the ledger; the caller renders all
//! three as the same invalid-credentials response.

use platform::password::{
    ClearTextPassword, HashedPassword, PasswordVerifyError,
};

/// Outcome of checking a submitted password against the stored hash
#[derive(Debug)]
pub enum PasswordCheck {
    /// Password matches
    Ok,
    /// Well-formed hash, wrong password
    Mismatch,
    /// Stored hash empty or not a recognizable Argon2 PHC string
    MalformedStored,
    /// The verification backend failed; treated as a rejection, never a
    /// pass (fail closed)
    BackendError(String),
}

/// Check `submitted` against the `stored_hash` PHC string loaded from the
/// users table.
pub fn check_password(
    stored_hash: &str,
    submitted: &str,
    pepper: Option<&[u8]>,
) -> PasswordCheck {
    let stored = match HashedPassword::from_phc_string(stored_hash) {
        Ok(h) => h,
        Err(_) => return PasswordCheck::MalformedStored,
    };

    // An empty or control-character submission can never match a real hash
    let cleartext = match ClearTextPassword::new(submitted.to_string()) {
        Ok(p) => p,
        Err(_) => return PasswordCheck::Mismatch,
    };

    match stored.verify(&cleartext, pepper) {
        Ok(()) => PasswordCheck::Ok,
        Err(PasswordVerifyError::Mismatch) => PasswordCheck::Mismatch,
        Err(PasswordVerifyError::MalformedHash) => PasswordCheck::MalformedStored,
        Err(PasswordVerifyError::Backend(msg)) => PasswordCheck::BackendError(msg),
    }
}

/// Hash a password for storage (fixtures, seeding, tests)
pub fn hash_password(
    raw: &str,
    pepper: Option<&[u8]>,
) -> Result<String, platform::password::PasswordHashError> {
    let cleartext = ClearTextPassword::new(raw.to_string())
        .map_err(|_| platform::password::PasswordHashError::HashingFailed("empty password".into()))?;
    Ok(cleartext.hash(pepper)?.as_phc_string().to_string())
}
