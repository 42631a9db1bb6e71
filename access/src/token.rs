//! Signed access-token format.
//!
//! Tokens are `<payload>.<signature>` where the payload is base64url
//! (no padding) over a JSON claims object and the signature is
//! HMAC-SHA256 over the encoded payload, keyed with a process-wide
//! secret.
//!
//! The embedded expiry is advisory only: the persisted row's
//! `expires_at` is the single source of truth for revocation, so
//! deleting a row revokes the credential even before cryptographic
//! expiry.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use bookstay_core::{AccessError, BookingId, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Purpose tag embedded in every guest access token.
///
/// Tokens carrying any other purpose are rejected during verification.
pub const GUEST_BOOKING_ACCESS_PURPOSE: &str = "guest_booking_access";

/// Claims carried by a signed access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    /// Booking the token grants access to.
    pub booking_id: String,

    /// Contact email the token was issued to.
    pub email: String,

    /// Purpose tag; must equal [`GUEST_BOOKING_ACCESS_PURPOSE`].
    pub purpose: String,

    /// Issuance instant, epoch milliseconds.
    pub issued_at: i64,

    /// Advisory expiry instant, epoch milliseconds. Always set to
    /// issuance + TTL; the persisted row is authoritative.
    pub expires_at: i64,

    /// Random value making every token string unique, independent of
    /// timestamp granularity.
    pub nonce: Uuid,
}

impl TokenClaims {
    /// Build claims for a new guest access token.
    #[must_use]
    pub fn new(
        booking_id: &BookingId,
        email: &str,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            booking_id: booking_id.as_str().to_string(),
            email: email.to_string(),
            purpose: GUEST_BOOKING_ACCESS_PURPOSE.to_string(),
            issued_at: issued_at.timestamp_millis(),
            expires_at: (issued_at + ttl).timestamp_millis(),
            nonce: Uuid::new_v4(),
        }
    }

    /// Advisory expiry as a timestamp, if representable.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.expires_at).single()
    }
}

/// Signs and verifies access tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret.
        f.debug_struct("TokenSigner").finish_non_exhaustive()
    }
}

impl TokenSigner {
    /// Create a signer from the process-wide secret.
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Encode and sign claims into an opaque token string.
    ///
    /// # Errors
    ///
    /// Returns an error if the claims cannot be serialized; this is an
    /// internal failure and should not occur for well-formed claims.
    pub fn sign(&self, claims: &TokenClaims) -> Result<String> {
        let payload_json = serde_json::to_vec(claims)
            .map_err(|e| AccessError::Internal(format!("Failed to serialize token claims: {e}")))?;
        let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json);

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AccessError::Internal(format!("Invalid HMAC key: {e}")))?;
        mac.update(payload_b64.as_bytes());
        let signature = mac.finalize().into_bytes();
        let sig_b64 = URL_SAFE_NO_PAD.encode(signature);

        Ok(format!("{payload_b64}.{sig_b64}"))
    }

    /// Verify a token's signature and decode its claims.
    ///
    /// Returns `None` on any structural or signature failure: wrong part
    /// count, invalid base64, signature mismatch, or malformed claims
    /// JSON. Callers must still check the purpose tag and the persisted
    /// record; signature validity alone grants nothing.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<TokenClaims> {
        let mut parts = token.split('.');
        let payload_b64 = parts.next()?;
        let sig_b64 = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let signature = URL_SAFE_NO_PAD.decode(sig_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(payload_b64.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        serde_json::from_slice(&payload).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> TokenClaims {
        TokenClaims::new(
            &BookingId::from("B1"),
            "a@x.com",
            Utc::now(),
            Duration::hours(24),
        )
    }

    #[test]
    fn test_sign_and_decode_round_trip() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let claims = claims();

        let token = signer.sign(&claims).unwrap();
        let decoded = signer.decode(&token).unwrap();

        assert_eq!(decoded, claims);
        assert_eq!(decoded.purpose, GUEST_BOOKING_ACCESS_PURPOSE);
    }

    #[test]
    fn test_decode_rejects_wrong_secret() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let other = TokenSigner::new(b"other-secret".to_vec());

        let token = signer.sign(&claims()).unwrap();

        assert!(other.decode(&token).is_none());
    }

    #[test]
    fn test_decode_rejects_tampered_payload() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let token = signer.sign(&claims()).unwrap();

        let sig = token.split('.').nth(1).unwrap();
        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&TokenClaims::new(
                &BookingId::from("B2"),
                "a@x.com",
                Utc::now(),
                Duration::hours(24),
            ))
            .unwrap(),
        );

        assert!(signer.decode(&format!("{forged_payload}.{sig}")).is_none());
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        let signer = TokenSigner::new(b"secret".to_vec());

        assert!(signer.decode("").is_none());
        assert!(signer.decode("no-separator").is_none());
        assert!(signer.decode("a.b.c").is_none());
        assert!(signer.decode("!!not-base64!!.also-not").is_none());
    }

    #[test]
    fn test_tokens_for_same_pair_are_unique() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let now = Utc::now();

        let first = signer
            .sign(&TokenClaims::new(
                &BookingId::from("B1"),
                "a@x.com",
                now,
                Duration::hours(24),
            ))
            .unwrap();
        let second = signer
            .sign(&TokenClaims::new(
                &BookingId::from("B1"),
                "a@x.com",
                now,
                Duration::hours(24),
            ))
            .unwrap();

        // Identical pair and timestamp still produce distinct tokens.
        assert_ne!(first, second);
    }

    #[test]
    fn test_embedded_expiry_matches_ttl() {
        let issued_at = Utc::now();
        let claims = TokenClaims::new(
            &BookingId::from("B1"),
            "a@x.com",
            issued_at,
            Duration::hours(24),
        );

        let expires = claims.expires_at().unwrap();
        assert_eq!(
            expires.timestamp_millis(),
            (issued_at + Duration::hours(24)).timestamp_millis()
        );
    }
}
