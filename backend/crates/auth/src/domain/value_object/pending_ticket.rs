//! Pending-MFA Ticket
//!
//! The short-lived, stateless token bridging the gap between a successful
//! password check and TOTP verification. Nothing is stored server-side:
//! integrity comes entirely from an HMAC-SHA256 signature keyed off the
//! server secret, freshness from an embedded expiry. A ticket must never
//! be accepted past its TTL or with a mismatched signature.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use kernel::id::UserId;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use platform::crypto::{from_base64url, to_base64url};

type HmacSha256 = Hmac<Sha256>;

/// Ticket rejection reasons. All of them collapse into the same
/// "sign in again" outcome for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TicketError {
    #[error("Malformed ticket")]
    Malformed,
    #[error("Ticket signature mismatch")]
    BadSignature,
    #[error("Ticket expired")]
    Expired,
}

/// Wire payload. Field names are part of the cookie format.
#[derive(Serialize, Deserialize)]
struct TicketClaims {
    uid: Uuid,
    sub: String,
    exp: i64,
}

/// A signed claim that `user_id` passed the password check and owes a
/// TOTP code before `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMfaTicket {
    pub user_id: UserId,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingMfaTicket {
    /// Mint a ticket valid for `ttl` from now.
    pub fn issue(user_id: UserId, username: impl Into<String>, ttl: Duration) -> Self {
        Self {
            user_id,
            username: username.into(),
            expires_at: Utc::now() + ttl,
        }
    }

    /// Encode as `base64url(claims).base64url(hmac)` for the cookie.
    pub fn encode(&self, key: &[u8; 32]) -> String {
        let claims = TicketClaims {
            uid: *self.user_id.as_uuid(),
            sub: self.username.clone(),
            exp: self.expires_at.timestamp(),
        };
        // Serialization of a plain struct cannot fail
        let payload = to_base64url(&serde_json::to_vec(&claims).expect("serialize ticket claims"));

        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        let signature = to_base64url(&mac.finalize().into_bytes());

        format!("{payload}.{signature}")
    }

    /// Decode and verify a ticket cookie.
    ///
    /// The signature is checked before the claims are even parsed, and the
    /// comparison runs in constant time inside the HMAC verifier.
    pub fn decode(token: &str, key: &[u8; 32], now: DateTime<Utc>) -> Result<Self, TicketError> {
        let (payload, signature_b64) = token.split_once('.').ok_or(TicketError::Malformed)?;

        let signature = from_base64url(signature_b64).map_err(|_| TicketError::Malformed)?;

        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TicketError::BadSignature)?;

        let claims: TicketClaims =
            serde_json::from_slice(&from_base64url(payload).map_err(|_| TicketError::Malformed)?)
                .map_err(|_| TicketError::Malformed)?;

        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or(TicketError::Malformed)?;

        if now > expires_at {
            return Err(TicketError::Expired);
        }

        Ok(Self {
            user_id: UserId::from_uuid(claims.uid),
            username: claims.sub,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8; 32] = &[7u8; 32];

    #[test]
    fn test_roundtrip() {
        let ticket = PendingMfaTicket::issue(UserId::new(), "bob", Duration::seconds(600));
        let token = ticket.encode(KEY);

        let decoded = PendingMfaTicket::decode(&token, KEY, Utc::now()).unwrap();
        assert_eq!(decoded.user_id, ticket.user_id);
        assert_eq!(decoded.username, "bob");
    }

    #[test]
    fn test_expired_rejected() {
        let ticket = PendingMfaTicket::issue(UserId::new(), "bob", Duration::seconds(600));
        let token = ticket.encode(KEY);

        let after_ttl = Utc::now() + Duration::seconds(601);
        assert_eq!(
            PendingMfaTicket::decode(&token, KEY, after_ttl),
            Err(TicketError::Expired)
        );
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let ticket = PendingMfaTicket::issue(UserId::new(), "bob", Duration::seconds(600));
        let token = ticket.encode(KEY);

        // Swap in a different payload while keeping the signature
        let (_, signature) = token.split_once('.').unwrap();
        let forged_claims = to_base64url(br#"{"uid":"00000000-0000-4000-8000-000000000000","sub":"mallory","exp":9999999999}"#);
        let forged = format!("{forged_claims}.{signature}");

        assert_eq!(
            PendingMfaTicket::decode(&forged, KEY, Utc::now()),
            Err(TicketError::BadSignature)
        );
    }

    #[test]
    fn test_wrong_key_rejected() {
        let ticket = PendingMfaTicket::issue(UserId::new(), "bob", Duration::seconds(600));
        let token = ticket.encode(KEY);

        let other_key = &[8u8; 32];
        assert_eq!(
            PendingMfaTicket::decode(&token, other_key, Utc::now()),
            Err(TicketError::BadSignature)
        );
    }

    #[test]
    fn test_garbage_rejected() {
        for junk in ["", "no-dot-here", "a.b", "..", "a.b.c"] {
            assert!(PendingMfaTicket::decode(junk, KEY, Utc::now()).is_err());
        }
    }
}
