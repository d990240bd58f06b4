//! Command handlers for the Synthesis Ordering context.
//!
//! Every handler follows the same order: admit the caller through the
//! revocation gate, load the order, apply the change in memory, save it
//! under a version check, and return the refreshed view. A failure at any
//! step leaves the stored order as it was.

use std::collections::HashMap;

use synthlab_core::command::Command;
use synthlab_core::deadline::bounded;
use synthlab_core::error::DomainError;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::context::SynthesisContext;
use crate::application::query_handlers::SynthesisView;
use crate::domain::aggregates::SynthesisOrder;
use crate::domain::commands::{
    AddReactionToDraft, DeleteSynthesis, FormSynthesis, ModerateSynthesis, RemoveLine,
    SetLineVolume, SetPurity,
};
use crate::domain::lifecycle::{ModerationDecision, Transition, authorize};
use crate::domain::result_volume::ReactionConstants;

/// Handles the `AddReactionToDraft` command: finds or creates the caller's
/// draft and adds one unit of the reaction to it.
///
/// # Errors
///
/// Returns `DomainError::ReactionNotFound` if the reaction is absent or
/// deleted; no draft is created in that case.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, reaction_id = %command.reaction_id))]
pub async fn handle_add_reaction_to_draft(
    command: &AddReactionToDraft,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;

    let exists = bounded(
        ctx.timeout,
        "catalog lookup",
        ctx.catalog.exists(command.reaction_id),
    )
    .await?;
    if !exists {
        return Err(DomainError::ReactionNotFound(command.reaction_id));
    }

    let now = ctx.clock.now();
    let candidate = SynthesisOrder::new_draft(Uuid::now_v7(), caller.user_id, now);
    let draft_id = bounded(
        ctx.timeout,
        "add to draft",
        ctx.orders.add_to_draft(&candidate, command.reaction_id, now),
    )
    .await?;

    info!(synthesis_id = %draft_id, user_id = %caller.user_id, "reaction added to draft");
    let refreshed = ctx.load_active(draft_id).await?;
    ctx.view(&refreshed).await
}

/// Handles the `SetLineVolume` command.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` for anyone but the creator, and the
/// errors of [`SynthesisOrder::set_line_volume`].
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, synthesis_id = %command.synthesis_id))]
pub async fn handle_set_line_volume(
    command: &SetLineVolume,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;
    let mut order = ctx.load_active(command.synthesis_id).await?;
    order.ensure_owned_by(&caller)?;

    order.set_line_volume(command.reaction_id, command.volume, ctx.clock.now())?;
    ctx.save(&mut order).await?;

    ctx.view(&order).await
}

/// Handles the `RemoveLine` command.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` for anyone but the creator, and the
/// errors of [`SynthesisOrder::remove_line`].
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, synthesis_id = %command.synthesis_id))]
pub async fn handle_remove_line(
    command: &RemoveLine,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;
    let mut order = ctx.load_active(command.synthesis_id).await?;
    order.ensure_owned_by(&caller)?;

    let remaining = order.remove_line(command.reaction_id, ctx.clock.now())?;
    ctx.save(&mut order).await?;

    info!(reaction_id = %command.reaction_id, remaining, "line decremented");
    ctx.view(&order).await
}

/// Handles the `SetPurity` command.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` for anyone but the creator, and the
/// errors of [`SynthesisOrder::set_purity`].
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, synthesis_id = %command.synthesis_id))]
pub async fn handle_set_purity(
    command: &SetPurity,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;
    let mut order = ctx.load_active(command.synthesis_id).await?;
    order.ensure_owned_by(&caller)?;

    order.set_purity(command.purity, ctx.clock.now())?;
    ctx.save(&mut order).await?;

    ctx.view(&order).await
}

/// Handles the `FormSynthesis` command: `draft → formed`.
///
/// # Errors
///
/// Returns the errors of [`SynthesisOrder::form`].
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, synthesis_id = %command.synthesis_id))]
pub async fn handle_form_synthesis(
    command: &FormSynthesis,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;
    let mut order = ctx.load_active(command.synthesis_id).await?;
    order.ensure_visible_to(&caller)?;

    if let Err(e) = order.form(&caller, ctx.clock.now()) {
        warn!(error = %e, "form rejected");
        return Err(e);
    }
    ctx.save(&mut order).await?;

    info!(
        command_type = command.command_type(),
        actor_id = ?command.actor_id(),
        "synthesis formed"
    );
    ctx.view(&order).await
}

async fn result_constants(
    order: &SynthesisOrder,
    ctx: &SynthesisContext<'_>,
) -> Result<HashMap<Uuid, ReactionConstants>, DomainError> {
    let mut constants = HashMap::with_capacity(order.lines().len());
    for line in order.lines() {
        // Historical lines may reference reactions deleted since they were
        // added; their constants are still authoritative.
        let reaction = bounded(
            ctx.timeout,
            "catalog lookup",
            ctx.catalog.get_including_deleted(line.reaction_id),
        )
        .await?
        .ok_or_else(|| {
            DomainError::Computation(format!(
                "reaction {} has no catalog record",
                line.reaction_id
            ))
        })?;
        constants.insert(line.reaction_id, ReactionConstants::from(&reaction));
    }
    Ok(constants)
}

/// Handles the `ModerateSynthesis` command: `formed → completed` or
/// `formed → rejected`. Completion computes every line's result volume in
/// the same save.
///
/// # Errors
///
/// Returns the errors of [`SynthesisOrder::complete`] or
/// [`SynthesisOrder::reject`]. A `DomainError::Computation` leaves the order
/// `formed`.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, synthesis_id = %command.synthesis_id, decision = ?command.decision))]
pub async fn handle_moderate_synthesis(
    command: &ModerateSynthesis,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;
    let mut order = ctx.load_active(command.synthesis_id).await?;
    let now = ctx.clock.now();

    let outcome = match command.decision {
        ModerationDecision::Complete => {
            authorize(
                Transition::Complete,
                order.status(),
                &caller,
                order.creator_id(),
            )?;
            let constants = result_constants(&order, ctx).await?;
            order.complete(&caller, &constants, now)
        }
        ModerationDecision::Reject => order.reject(&caller, now),
    };
    if let Err(e) = outcome {
        warn!(error = %e, "moderation rejected");
        return Err(e);
    }
    ctx.save(&mut order).await?;

    info!(moderator_id = %caller.user_id, status = %order.status(), "synthesis moderated");
    ctx.view(&order).await
}

/// Handles the `DeleteSynthesis` command.
///
/// # Errors
///
/// Returns the errors of [`SynthesisOrder::delete`].
#[instrument(skip_all, fields(correlation_id = %command.correlation_id, synthesis_id = %command.synthesis_id))]
pub async fn handle_delete_synthesis(
    command: &DeleteSynthesis,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(&command.token).await?;
    let mut order = ctx.load_active(command.synthesis_id).await?;
    order.ensure_visible_to(&caller)?;

    order.delete(&caller, ctx.clock.now())?;
    ctx.save(&mut order).await?;

    info!(user_id = %caller.user_id, "synthesis deleted");
    ctx.view(&order).await
}
