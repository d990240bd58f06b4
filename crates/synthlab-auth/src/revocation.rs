//! Token revocation.
//!
//! A revoked token is recorded under a digest of its encoded form. Each
//! record expires at the token's own `exp`, so an expired record can never
//! re-admit a still-valid token and never outlives it.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use synthlab_core::clock::Clock;
use synthlab_core::deadline::bounded;
use synthlab_core::error::DomainError;
use synthlab_core::identity::CallerIdentity;
use tracing::{info, warn};

use crate::token::VerifiedToken;

/// Storage for revocation records.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Returns `true` if an unexpired record exists for `key`.
    async fn is_revoked(&self, key: &str) -> Result<bool, DomainError>;

    /// Records `key` as revoked until `expires_at`. Re-revoking keeps the
    /// later of the two expiries.
    async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError>;
}

/// The key a token is revoked under: the lowercase hex SHA-256 of its
/// encoded form.
#[must_use]
pub fn revocation_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Admission check in front of every state-mutating use case.
#[derive(Clone)]
pub struct RevocationGate {
    store: Arc<dyn RevocationStore>,
    timeout: std::time::Duration,
}

impl fmt::Debug for RevocationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevocationGate")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RevocationGate {
    /// Creates a gate over `store` whose lookups give up after `timeout`.
    #[must_use]
    pub fn new(store: Arc<dyn RevocationStore>, timeout: std::time::Duration) -> Self {
        Self { store, timeout }
    }

    /// Returns `true` if `token` has been revoked.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store fails or does not
    /// answer in time.
    pub async fn is_revoked(&self, token: &VerifiedToken) -> Result<bool, DomainError> {
        let key = revocation_key(token.raw());
        bounded(self.timeout, "revocation lookup", self.store.is_revoked(&key)).await
    }

    /// Admits the bearer of `token`, returning their identity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Unauthenticated` if the token is revoked and
    /// `DomainError::Infrastructure` if revocation status is unknown. The
    /// gate fails closed.
    pub async fn admit(&self, token: &VerifiedToken) -> Result<CallerIdentity, DomainError> {
        match self.is_revoked(token).await {
            Ok(false) => Ok(token.identity()),
            Ok(true) => Err(DomainError::Unauthenticated(
                "token has been revoked".to_owned(),
            )),
            Err(e) => {
                warn!(user_id = %token.identity().user_id, error = %e, "revocation status unknown");
                Err(e)
            }
        }
    }

    /// Admits the bearer of `token` only if they are a moderator.
    ///
    /// # Errors
    ///
    /// As [`admit`](Self::admit), plus `DomainError::Forbidden` for
    /// non-moderators.
    pub async fn admit_moderator(
        &self,
        token: &VerifiedToken,
    ) -> Result<CallerIdentity, DomainError> {
        let caller = self.admit(token).await?;
        if caller.is_moderator() {
            Ok(caller)
        } else {
            Err(DomainError::Forbidden(
                "moderator role required".to_owned(),
            ))
        }
    }

    /// Revokes `token` for the rest of its lifetime. A token that has
    /// already expired is not recorded.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the store fails or does not
    /// answer in time.
    pub async fn revoke(&self, token: &VerifiedToken, clock: &dyn Clock) -> Result<(), DomainError> {
        let expires_at = token.expires_at();
        if clock.remaining_until(expires_at) <= chrono::Duration::zero() {
            return Ok(());
        }

        let key = revocation_key(token.raw());
        bounded(
            self.timeout,
            "revocation write",
            self.store.revoke(&key, expires_at),
        )
        .await?;

        info!(
            user_id = %token.identity().user_id,
            expires_at = %expires_at,
            "token revoked"
        );
        Ok(())
    }
}
