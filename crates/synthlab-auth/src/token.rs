//! Bearer token issuing and verification.
//!
//! Tokens are HS256 JWTs. Expiry is checked against the injected `Clock`
//! rather than the wall clock so that verification and revocation TTLs agree.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use synthlab_core::clock::Clock;
use synthlab_core::error::DomainError;
use synthlab_core::identity::{CallerIdentity, Role};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    moderator: bool,
    iss: String,
    iat: i64,
    exp: i64,
    jti: Uuid,
}

/// A freshly issued bearer token.
#[derive(Clone, Serialize)]
pub struct IssuedToken {
    /// The encoded token.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Seconds until the token expires.
    pub expires_in: i64,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// A token whose signature, issuer and expiry have been checked.
///
/// Revocation is not part of verification; see
/// [`RevocationGate`](crate::revocation::RevocationGate).
#[derive(Clone)]
pub struct VerifiedToken {
    identity: CallerIdentity,
    raw: String,
    expires_at: DateTime<Utc>,
}

impl VerifiedToken {
    /// The caller the token was issued to.
    #[must_use]
    pub fn identity(&self) -> CallerIdentity {
        self.identity
    }

    /// The encoded token as presented by the caller.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// When the token stops being accepted.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl fmt::Debug for VerifiedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifiedToken")
            .field("identity", &self.identity)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Encodes and decodes bearer tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Creates a codec for `issuer` whose tokens live for `ttl`.
    #[must_use]
    pub fn new(secret: &[u8], issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Issues a token for `identity`, valid from `clock.now()` for the
    /// configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if encoding fails.
    pub fn issue(
        &self,
        identity: CallerIdentity,
        clock: &dyn Clock,
    ) -> Result<IssuedToken, DomainError> {
        let issued_at = clock.now();
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: identity.user_id,
            moderator: identity.is_moderator(),
            iss: self.issuer.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Infrastructure(format!("failed to sign token: {e}")))?;

        Ok(IssuedToken {
            access_token,
            token_type: "Bearer",
            expires_in: self.ttl.num_seconds(),
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(expires_at),
        })
    }

    /// Verifies signature, issuer and expiry of `token`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthenticated` if the token is malformed, signed
    /// with another key, issued by another issuer, or expired.
    pub fn verify(&self, token: &str, clock: &dyn Clock) -> Result<VerifiedToken, DomainError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared against the injected clock below.
        validation.validate_exp = false;
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| DomainError::Unauthenticated(format!("invalid token: {e}")))?;
        let claims = data.claims;

        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| DomainError::Unauthenticated("invalid token expiry".to_owned()))?;
        if expires_at <= clock.now() {
            return Err(DomainError::Unauthenticated("token expired".to_owned()));
        }

        let role = if claims.moderator {
            Role::Moderator
        } else {
            Role::User
        };

        Ok(VerifiedToken {
            identity: CallerIdentity {
                user_id: claims.sub,
                role,
            },
            raw: token.to_owned(),
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[derive(Debug)]
    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret", "synthlab", Duration::hours(1))
    }

    #[test]
    fn test_issue_then_verify_returns_identity() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let clock = FixedClock(now);
        let identity = CallerIdentity::moderator(Uuid::new_v4());

        // Act
        let issued = codec().issue(identity, &clock).unwrap();
        let verified = codec().verify(&issued.access_token, &clock).unwrap();

        // Assert
        assert_eq!(verified.identity(), identity);
        assert_eq!(verified.expires_at(), now + Duration::hours(1));
        assert_eq!(issued.expires_in, 3600);
        assert_eq!(verified.raw(), issued.access_token);
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Arrange
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
        let issued = codec()
            .issue(CallerIdentity::user(Uuid::new_v4()), &FixedClock(now))
            .unwrap();
        let later = FixedClock(now + Duration::hours(1));

        // Act
        let result = codec().verify(&issued.access_token, &later);

        // Assert
        match result.unwrap_err() {
            DomainError::Unauthenticated(msg) => assert!(msg.contains("expired")),
            other => panic!("expected Unauthenticated, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_rejects_foreign_signature() {
        // Arrange
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let foreign = TokenCodec::new(b"other-secret", "synthlab", Duration::hours(1));
        let issued = foreign
            .issue(CallerIdentity::user(Uuid::new_v4()), &clock)
            .unwrap();

        // Act
        let result = codec().verify(&issued.access_token, &clock);

        // Assert
        assert!(matches!(
            result.unwrap_err(),
            DomainError::Unauthenticated(_)
        ));
    }

    #[test]
    fn test_two_tokens_for_same_user_differ() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let identity = CallerIdentity::user(Uuid::new_v4());

        let first = codec().issue(identity, &clock).unwrap();
        let second = codec().issue(identity, &clock).unwrap();

        assert_ne!(first.access_token, second.access_token);
    }

    #[test]
    fn test_debug_output_redacts_token() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap());
        let issued = codec()
            .issue(CallerIdentity::user(Uuid::new_v4()), &clock)
            .unwrap();
        let verified = codec().verify(&issued.access_token, &clock).unwrap();

        assert!(!format!("{verified:?}").contains(&issued.access_token));
        assert!(!format!("{issued:?}").contains(&issued.access_token));
    }
}
