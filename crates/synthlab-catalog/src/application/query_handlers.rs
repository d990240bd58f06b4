//! Query handlers for the Reaction Catalog context.
//!
//! Catalog reads are public and never consult the revocation gate.

use serde::Serialize;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::domain::reaction::{MaterialDescriptor, Reaction};
use crate::repository::{ImageStore, ReactionRepository};

/// Read-only view of a catalog entry.
#[derive(Debug, Serialize)]
pub struct ReactionView {
    /// The reaction identifier.
    pub reaction_id: Uuid,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub details: String,
    /// What the reaction consumes.
    pub starting_material: MaterialDescriptor,
    /// What the reaction produces.
    pub result_material: MaterialDescriptor,
    /// Where the image can be fetched, if one is attached.
    pub image_url: Option<String>,
}

impl ReactionView {
    /// Builds the view of `reaction`, resolving its image through `images`.
    #[must_use]
    pub fn from_reaction(reaction: Reaction, images: &dyn ImageStore) -> Self {
        Self {
            reaction_id: reaction.id,
            image_url: reaction.image_ref.as_deref().map(|r| images.public_url(r)),
            title: reaction.title,
            details: reaction.details,
            starting_material: reaction.starting_material,
            result_material: reaction.result_material,
        }
    }
}

/// Lists active reactions, optionally filtered by title.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if the catalog cannot be read.
pub async fn list_reactions(
    title: Option<&str>,
    repo: &dyn ReactionRepository,
    images: &dyn ImageStore,
) -> Result<Vec<ReactionView>, DomainError> {
    let title = title.map(str::trim).filter(|t| !t.is_empty());
    let reactions = repo.search(title).await?;
    Ok(reactions
        .into_iter()
        .map(|r| ReactionView::from_reaction(r, images))
        .collect())
}

/// Retrieves one active reaction.
///
/// # Errors
///
/// Returns `DomainError::ReactionNotFound` if it is missing or deleted.
pub async fn get_reaction(
    reaction_id: Uuid,
    repo: &dyn ReactionRepository,
    images: &dyn ImageStore,
) -> Result<ReactionView, DomainError> {
    let reaction = repo.get(reaction_id).await?;
    Ok(ReactionView::from_reaction(reaction, images))
}
