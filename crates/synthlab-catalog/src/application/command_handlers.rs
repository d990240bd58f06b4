//! Command handlers for the Reaction Catalog context.
//!
//! Each handler admits the caller through the revocation gate, loads the
//! entry, applies the change and persists it. Image objects are cleaned up
//! on a best-effort basis; a failed cleanup is logged and never fails the
//! command.

use synthlab_core::command::Command;
use synthlab_core::error::DomainError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::context::CatalogContext;
use crate::domain::commands::{
    AttachReactionImage, CreateReaction, DeleteReaction, RestoreReaction, UpdateReaction,
};
use crate::domain::reaction::Reaction;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

fn image_extension(file_name: &str) -> Result<String, DomainError> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(DomainError::Validation(format!(
            "unsupported image type '{file_name}', expected one of {}",
            IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

async fn discard_image(ctx: &CatalogContext<'_>, reference: &str, reaction_id: Uuid) {
    if let Err(e) = ctx.remove_image(reference).await {
        warn!(%reaction_id, reference, error = %e, "failed to remove image object");
    }
}

/// Handles the `CreateReaction` command.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` for non-moderators and the validation
/// errors of [`Reaction::create`].
pub async fn handle_create_reaction(
    command: &CreateReaction,
    ctx: &CatalogContext<'_>,
) -> Result<Reaction, DomainError> {
    ctx.gate.admit_moderator(&command.token).await?;

    let reaction = Reaction::create(Uuid::now_v7(), command.reaction.clone())?;
    ctx.save(&reaction).await?;

    info!(
        correlation_id = %command.correlation_id(),
        reaction_id = %reaction.id,
        "reaction created"
    );
    Ok(reaction)
}

/// Handles the `UpdateReaction` command.
///
/// # Errors
///
/// Returns `DomainError::ReactionNotFound` for a missing or deleted reaction
/// and the validation errors of [`Reaction::apply_patch`].
pub async fn handle_update_reaction(
    command: &UpdateReaction,
    ctx: &CatalogContext<'_>,
) -> Result<Reaction, DomainError> {
    ctx.gate.admit_moderator(&command.token).await?;

    let mut reaction = ctx.get(command.reaction_id).await?;
    reaction.apply_patch(&command.patch)?;
    ctx.save(&reaction).await?;

    info!(
        correlation_id = %command.correlation_id(),
        reaction_id = %reaction.id,
        "reaction updated"
    );
    Ok(reaction)
}

/// Handles the `DeleteReaction` command. The entry is soft-deleted; order
/// lines referencing it are left intact.
///
/// # Errors
///
/// Returns `DomainError::ReactionNotFound` if the reaction is missing or
/// already deleted.
pub async fn handle_delete_reaction(
    command: &DeleteReaction,
    ctx: &CatalogContext<'_>,
) -> Result<(), DomainError> {
    ctx.gate.admit_moderator(&command.token).await?;

    let mut reaction = ctx.get(command.reaction_id).await?;
    let detached = reaction.mark_deleted();
    ctx.save(&reaction).await?;

    if let Some(reference) = detached {
        discard_image(ctx, &reference, reaction.id).await;
    }

    info!(
        correlation_id = %command.correlation_id(),
        reaction_id = %reaction.id,
        "reaction deleted"
    );
    Ok(())
}

/// Handles the `RestoreReaction` command.
///
/// # Errors
///
/// Returns `DomainError::ReactionNotFound` if no such reaction was ever
/// created.
pub async fn handle_restore_reaction(
    command: &RestoreReaction,
    ctx: &CatalogContext<'_>,
) -> Result<Reaction, DomainError> {
    ctx.gate.admit_moderator(&command.token).await?;

    let mut reaction = ctx
        .get_including_deleted(command.reaction_id)
        .await?
        .ok_or(DomainError::ReactionNotFound(command.reaction_id))?;
    if reaction.is_deleted {
        reaction.restore();
        ctx.save(&reaction).await?;
        info!(
            correlation_id = %command.correlation_id(),
            reaction_id = %reaction.id,
            "reaction restored"
        );
    }

    Ok(reaction)
}

/// Handles the `AttachReactionImage` command.
///
/// The new object is uploaded before the entry is saved. If the save fails
/// the upload is removed again; if it succeeds the replaced object is.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an empty upload or an unsupported
/// file type, and `DomainError::ReactionNotFound` for a missing or deleted
/// reaction.
pub async fn handle_attach_reaction_image(
    command: &AttachReactionImage,
    ctx: &CatalogContext<'_>,
) -> Result<Reaction, DomainError> {
    ctx.gate.admit_moderator(&command.token).await?;

    if command.bytes.is_empty() {
        return Err(DomainError::Validation("image file is empty".to_owned()));
    }
    let extension = image_extension(&command.file_name)?;
    let mut reaction = ctx.get(command.reaction_id).await?;

    let object_name = format!(
        "reactions/{}-{}.{extension}",
        reaction.id,
        Uuid::new_v4().simple()
    );
    let reference = ctx
        .put_image(
            &object_name,
            command.content_type.as_deref(),
            command.bytes.clone(),
        )
        .await?;

    let replaced = reaction.replace_image(reference.clone());
    if let Err(e) = ctx.save(&reaction).await {
        discard_image(ctx, &reference, reaction.id).await;
        return Err(e);
    }
    if let Some(old) = replaced {
        discard_image(ctx, &old, reaction.id).await;
    }

    info!(
        correlation_id = %command.correlation_id(),
        reaction_id = %reaction.id,
        "reaction image attached"
    );
    Ok(reaction)
}
