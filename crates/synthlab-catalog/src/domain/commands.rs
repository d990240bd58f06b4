//! Commands for the Reaction Catalog context.
//!
//! Every catalog mutation is moderator-only.

use synthlab_auth::token::VerifiedToken;
use synthlab_core::command::Command;
use uuid::Uuid;

use crate::domain::reaction::{NewReaction, ReactionPatch};

/// Command to add a reaction to the catalog.
#[derive(Debug, Clone)]
pub struct CreateReaction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The entry to create.
    pub reaction: NewReaction,
}

impl Command for CreateReaction {
    fn command_type(&self) -> &'static str {
        "catalog.create_reaction"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to change attributes of a reaction.
#[derive(Debug, Clone)]
pub struct UpdateReaction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The reaction to change.
    pub reaction_id: Uuid,
    /// Attributes to change.
    pub patch: ReactionPatch,
}

impl Command for UpdateReaction {
    fn command_type(&self) -> &'static str {
        "catalog.update_reaction"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to soft-delete a reaction.
#[derive(Debug, Clone)]
pub struct DeleteReaction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The reaction to delete.
    pub reaction_id: Uuid,
}

impl Command for DeleteReaction {
    fn command_type(&self) -> &'static str {
        "catalog.delete_reaction"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to undo a soft delete.
#[derive(Debug, Clone)]
pub struct RestoreReaction {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The reaction to restore.
    pub reaction_id: Uuid,
}

impl Command for RestoreReaction {
    fn command_type(&self) -> &'static str {
        "catalog.restore_reaction"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to upload a reaction's image, replacing any previous one.
#[derive(Debug, Clone)]
pub struct AttachReactionImage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The reaction the image belongs to.
    pub reaction_id: Uuid,
    /// Original file name; only its extension is kept.
    pub file_name: String,
    /// MIME type reported by the client.
    pub content_type: Option<String>,
    /// Image bytes.
    pub bytes: Vec<u8>,
}

impl Command for AttachReactionImage {
    fn command_type(&self) -> &'static str {
        "catalog.attach_reaction_image"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}
