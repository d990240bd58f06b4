//! `PostgreSQL` implementation of the `RevocationStore` trait.
//!
//! Each row carries the revoked token's own expiry. Reads compare it with the
//! injected clock and ignore expired rows, so correctness does not depend on
//! [`PgRevocationStore::purge_expired`] running.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use synthlab_auth::revocation::RevocationStore;
use synthlab_core::clock::Clock;
use synthlab_core::error::DomainError;

use crate::error::db_error;

/// PostgreSQL-backed revocation set.
#[derive(Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PgRevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgRevocationStore")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}

impl PgRevocationStore {
    /// Creates a new `PgRevocationStore`.
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Deletes every record whose lifetime has ended. Returns the number of
    /// records removed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the delete fails.
    pub async fn purge_expired(&self) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(self.clock.now())
            .execute(&self.pool)
            .await
            .map_err(db_error("revocation purge"))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn is_revoked(&self, key: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE token_digest = $1 AND expires_at > $2)",
        )
        .bind(key)
        .bind(self.clock.now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("revocation lookup"))
    }

    async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO revoked_tokens (token_digest, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_digest) \
             DO UPDATE SET expires_at = GREATEST(revoked_tokens.expires_at, EXCLUDED.expires_at)",
        )
        .bind(key)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(db_error("revocation write"))?;
        Ok(())
    }
}
