//! Commands for the Synthesis Ordering context.

use synthlab_auth::token::VerifiedToken;
use synthlab_core::command::Command;
use uuid::Uuid;

use crate::domain::lifecycle::ModerationDecision;

/// Command to add one unit of a reaction to the caller's draft, creating the draft if needed.
#[derive(Debug, Clone)]
pub struct AddReactionToDraft {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The catalog reaction to add.
    pub reaction_id: Uuid,
}

impl Command for AddReactionToDraft {
    fn command_type(&self) -> &'static str {
        "synthesis.add_reaction_to_draft"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to set the starting-material volume of one line.
#[derive(Debug, Clone)]
pub struct SetLineVolume {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The order to edit.
    pub synthesis_id: Uuid,
    /// The line's reaction.
    pub reaction_id: Uuid,
    /// Starting-material volume.
    pub volume: f64,
}

impl Command for SetLineVolume {
    fn command_type(&self) -> &'static str {
        "synthesis.set_line_volume"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to remove one unit of a reaction from a draft.
#[derive(Debug, Clone)]
pub struct RemoveLine {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The order to edit.
    pub synthesis_id: Uuid,
    /// The line's reaction.
    pub reaction_id: Uuid,
}

impl Command for RemoveLine {
    fn command_type(&self) -> &'static str {
        "synthesis.remove_line"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to set a draft's purity percentage.
#[derive(Debug, Clone)]
pub struct SetPurity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The order to edit.
    pub synthesis_id: Uuid,
    /// Purity in percent, `0 < p <= 100`.
    pub purity: f64,
}

impl Command for SetPurity {
    fn command_type(&self) -> &'static str {
        "synthesis.set_purity"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to submit a draft for moderation.
#[derive(Debug, Clone)]
pub struct FormSynthesis {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The order to submit.
    pub synthesis_id: Uuid,
}

impl Command for FormSynthesis {
    fn command_type(&self) -> &'static str {
        "synthesis.form"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to complete or reject a formed order.
#[derive(Debug, Clone)]
pub struct ModerateSynthesis {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The order to decide.
    pub synthesis_id: Uuid,
    /// The verdict.
    pub decision: ModerationDecision,
}

impl Command for ModerateSynthesis {
    fn command_type(&self) -> &'static str {
        "synthesis.moderate"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}

/// Command to logically delete an active order.
#[derive(Debug, Clone)]
pub struct DeleteSynthesis {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The caller's token.
    pub token: VerifiedToken,
    /// The order to delete.
    pub synthesis_id: Uuid,
}

impl Command for DeleteSynthesis {
    fn command_type(&self) -> &'static str {
        "synthesis.delete"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    fn actor_id(&self) -> Option<Uuid> {
        Some(self.token.identity().user_id)
    }
}
