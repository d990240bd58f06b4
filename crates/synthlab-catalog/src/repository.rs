//! Persistence and object-storage ports for the catalog.

use async_trait::async_trait;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::domain::reaction::Reaction;

/// Storage for catalog entries.
#[async_trait]
pub trait ReactionRepository: Send + Sync {
    /// Loads an active reaction.
    ///
    /// Returns `DomainError::ReactionNotFound` if it is absent or deleted.
    async fn get(&self, reaction_id: Uuid) -> Result<Reaction, DomainError>;

    /// Returns `true` if an active reaction with this id exists.
    async fn exists(&self, reaction_id: Uuid) -> Result<bool, DomainError>;

    /// Loads a reaction whether or not it has been deleted.
    async fn get_including_deleted(
        &self,
        reaction_id: Uuid,
    ) -> Result<Option<Reaction>, DomainError>;

    /// Loads the active reactions among `reaction_ids`. Missing and deleted
    /// ids are skipped.
    async fn find_active(&self, reaction_ids: &[Uuid]) -> Result<Vec<Reaction>, DomainError>;

    /// Lists active reactions, optionally filtered by a case-insensitive
    /// title substring, ordered by title.
    async fn search(&self, title: Option<&str>) -> Result<Vec<Reaction>, DomainError>;

    /// Inserts or replaces a reaction.
    async fn save(&self, reaction: &Reaction) -> Result<(), DomainError>;
}

/// Object storage for reaction images.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `object_name` and returns the stored reference.
    async fn put(
        &self,
        object_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError>;

    /// The URL clients fetch `reference` from.
    fn public_url(&self, reference: &str) -> String;

    /// Removes a previously stored object. Removing a missing object is not
    /// an error.
    async fn remove(&self, reference: &str) -> Result<(), DomainError>;
}
