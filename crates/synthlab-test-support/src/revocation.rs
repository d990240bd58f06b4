//! Revocation stores for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use synthlab_auth::revocation::RevocationStore;
use synthlab_core::error::DomainError;

/// A revocation store that keeps keys and their expiry instants. Entries
/// never expire.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    keys: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationStore {
    /// The expiry recorded for `key`, if revoked.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn expiry_of(&self, key: &str) -> Option<DateTime<Utc>> {
        self.keys.lock().unwrap().get(key).copied()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn is_revoked(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.keys.lock().unwrap().contains_key(key))
    }

    async fn revoke(&self, key: &str, expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut keys = self.keys.lock().unwrap();
        let entry = keys.entry(key.to_owned()).or_insert(expires_at);
        *entry = (*entry).max(expires_at);
        Ok(())
    }
}

/// A revocation store that is always unreachable.
#[derive(Debug)]
pub struct FailingRevocationStore;

#[async_trait]
impl RevocationStore for FailingRevocationStore {
    async fn is_revoked(&self, _key: &str) -> Result<bool, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn revoke(&self, _key: &str, _expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
