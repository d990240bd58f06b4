//! Collaborators shared by the catalog commands.

use std::time::Duration;

use synthlab_auth::revocation::RevocationGate;
use synthlab_core::deadline::bounded;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::domain::reaction::Reaction;
use crate::repository::{ImageStore, ReactionRepository};

/// The collaborators a catalog command runs against.
///
/// Repository and image-store calls made through the context are bounded by
/// `timeout`.
#[derive(Clone, Copy)]
pub struct CatalogContext<'a> {
    /// Revocation and role check run before anything else.
    pub gate: &'a RevocationGate,
    /// Catalog storage.
    pub reactions: &'a dyn ReactionRepository,
    /// Reaction image storage.
    pub images: &'a dyn ImageStore,
    /// Deadline for each storage call.
    pub timeout: Duration,
}

impl CatalogContext<'_> {
    pub(crate) async fn get(&self, reaction_id: Uuid) -> Result<Reaction, DomainError> {
        bounded(self.timeout, "reaction load", self.reactions.get(reaction_id)).await
    }

    pub(crate) async fn get_including_deleted(
        &self,
        reaction_id: Uuid,
    ) -> Result<Option<Reaction>, DomainError> {
        bounded(
            self.timeout,
            "reaction load",
            self.reactions.get_including_deleted(reaction_id),
        )
        .await
    }

    pub(crate) async fn save(&self, reaction: &Reaction) -> Result<(), DomainError> {
        bounded(self.timeout, "reaction save", self.reactions.save(reaction)).await
    }

    pub(crate) async fn put_image(
        &self,
        object_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        bounded(
            self.timeout,
            "image upload",
            self.images.put(object_name, content_type, bytes),
        )
        .await
    }

    pub(crate) async fn remove_image(&self, reference: &str) -> Result<(), DomainError> {
        bounded(self.timeout, "image removal", self.images.remove(reference)).await
    }
}
