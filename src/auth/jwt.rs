//! JWT Token Codec
//! Mission: Encode and verify signed, time-limited claims
//!
//! Payloads are the caller's claims flattened next to `iat`/`exp`. The token
//! class (access vs refresh) lives in the JOSE header `typ` so the payload
//! stays exactly the claim set, and a refresh token can never be replayed as
//! an access token or the other way around.

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Which kind of token is being minted or checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn typ(self) -> &'static str {
        match self {
            TokenKind::Access => "JWT",
            TokenKind::Refresh => "refresh+jwt",
        }
    }
}

/// Claims plus the standard issued-at / expiry timestamps (epoch seconds).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPayload<T> {
    #[serde(flatten)]
    pub claims: T,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed or signature mismatch")]
    Malformed,
    #[error("signing secret not configured")]
    MissingSecret,
}

/// Symmetric (HS256) token codec
pub struct TokenCodec {
    secret: Vec<u8>,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().into_bytes(),
        }
    }

    /// Encode claims valid from now for `lifetime`.
    pub fn encode<T: Serialize>(
        &self,
        kind: TokenKind,
        claims: &T,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        self.encode_at(kind, claims, lifetime, Utc::now().timestamp())
    }

    /// Encode with an explicit issue time.
    pub fn encode_at<T: Serialize>(
        &self,
        kind: TokenKind,
        claims: &T,
        lifetime: Duration,
        issued_at: i64,
    ) -> Result<String, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let lifetime_secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
        let payload = TokenPayload {
            claims,
            iat: issued_at,
            exp: issued_at.saturating_add(lifetime_secs),
        };

        let header = Header {
            typ: Some(kind.typ().to_string()),
            ..Header::default()
        };

        debug!(kind = ?kind, exp = payload.exp, "Minting token");

        // HS256 signing only fails on serialization of the payload
        encode(&header, &payload, &EncodingKey::from_secret(&self.secret))
            .map_err(|_| TokenError::Malformed)
    }

    /// Verify signature, class and expiry against the current time.
    pub fn decode<T: DeserializeOwned>(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> Result<TokenPayload<T>, TokenError> {
        self.decode_at(kind, token, Utc::now().timestamp())
    }

    /// Verify against an explicit clock. A token is expired once
    /// `now >= exp`, with no leeway.
    pub fn decode_at<T: DeserializeOwned>(
        &self,
        kind: TokenKind,
        token: &str,
        now: i64,
    ) -> Result<TokenPayload<T>, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if header.typ.as_deref() != Some(kind.typ()) {
            return Err(TokenError::Malformed);
        }

        let mut validation = Validation::default();
        validation.leeway = 0;
        // Expiry is checked below with an inclusive boundary
        validation.validate_exp = false;

        let decoded = decode::<TokenPayload<T>>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(|_| TokenError::Malformed)?;

        if now >= decoded.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::{AccessClaims, RefreshClaims, Role, SubscriptionStatus};

    const ISSUED: i64 = 1_700_000_000;

    fn access_claims() -> AccessClaims {
        AccessClaims {
            user_id: "user-1".to_string(),
            role: Role::Creator,
            subscription_status: SubscriptionStatus::Free,
        }
    }

    #[test]
    fn test_encode_and_decode() {
        let codec = TokenCodec::new("test-secret-key-12345");
        let token = codec
            .encode(TokenKind::Access, &access_claims(), Duration::from_secs(900))
            .unwrap();
        assert!(!token.is_empty());

        let payload = codec
            .decode::<AccessClaims>(TokenKind::Access, &token)
            .unwrap();
        assert_eq!(payload.claims, access_claims());
        assert_eq!(payload.exp - payload.iat, 900);
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let codec = TokenCodec::new("test-secret-key-12345");
        let lifetime = Duration::from_secs(60);
        let token = codec
            .encode_at(TokenKind::Access, &access_claims(), lifetime, ISSUED)
            .unwrap();

        let just_before = codec.decode_at::<AccessClaims>(TokenKind::Access, &token, ISSUED + 59);
        assert!(just_before.is_ok());

        let at_expiry = codec.decode_at::<AccessClaims>(TokenKind::Access, &token, ISSUED + 60);
        assert_eq!(at_expiry.unwrap_err(), TokenError::Expired);

        let after = codec.decode_at::<AccessClaims>(TokenKind::Access, &token, ISSUED + 3600);
        assert_eq!(after.unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = TokenCodec::new("test-secret-key-12345");
        let result = codec.decode::<AccessClaims>(TokenKind::Access, "invalid.token.here");
        assert_eq!(result.unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_different_secrets_reject() {
        let codec1 = TokenCodec::new("secret1");
        let codec2 = TokenCodec::new("secret2");

        let token = codec1
            .encode(TokenKind::Access, &access_claims(), Duration::from_secs(60))
            .unwrap();

        let result = codec2.decode::<AccessClaims>(TokenKind::Access, &token);
        assert_eq!(result.unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn test_token_classes_do_not_mix() {
        let codec = TokenCodec::new("test-secret-key-12345");
        let refresh = codec
            .encode(
                TokenKind::Refresh,
                &RefreshClaims {
                    user_id: "user-1".to_string(),
                },
                Duration::from_secs(60),
            )
            .unwrap();
        let access = codec
            .encode(TokenKind::Access, &access_claims(), Duration::from_secs(60))
            .unwrap();

        assert_eq!(
            codec
                .decode::<RefreshClaims>(TokenKind::Access, &refresh)
                .unwrap_err(),
            TokenError::Malformed
        );
        assert_eq!(
            codec
                .decode::<RefreshClaims>(TokenKind::Refresh, &access)
                .unwrap_err(),
            TokenError::Malformed
        );
    }

    #[test]
    fn test_refresh_payload_carries_only_user_id() {
        let codec = TokenCodec::new("test-secret-key-12345");
        let token = codec
            .encode(
                TokenKind::Refresh,
                &RefreshClaims {
                    user_id: "user-1".to_string(),
                },
                Duration::from_secs(60),
            )
            .unwrap();

        let raw = codec
            .decode::<serde_json::Value>(TokenKind::Refresh, &token)
            .unwrap();
        let fields = raw.claims.as_object().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["userId"], "user-1");
    }

    #[test]
    fn test_empty_secret_refuses_to_sign() {
        let codec = TokenCodec::new("");
        let result = codec.encode(TokenKind::Access, &access_claims(), Duration::from_secs(60));
        assert_eq!(result.unwrap_err(), TokenError::MissingSecret);
    }
}
