//! Query handlers for the Synthesis Ordering context.
//!
//! Reads go through the revocation gate like writes do: a logged-out token
//! sees nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use synthlab_auth::token::VerifiedToken;
use synthlab_catalog::domain::reaction::MaterialDescriptor;
use synthlab_core::deadline::bounded;
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::application::context::SynthesisContext;
use crate::application::projection::{LineDetail, LineProjection};
use crate::domain::aggregates::{SynthesisOrder, SynthesisRecord};
use crate::domain::status::SynthesisStatus;
use crate::repository::SynthesisFilter;

/// One visible line of an order.
#[derive(Debug, Clone, Serialize)]
pub struct LineView {
    /// The catalog reaction.
    pub reaction_id: Uuid,
    /// The reaction's title.
    pub title: String,
    /// The reaction's starting material.
    pub starting_material: MaterialDescriptor,
    /// The reaction's result material.
    pub result_material: MaterialDescriptor,
    /// Number of units.
    pub quantity: u32,
    /// Starting-material volume.
    pub volume_sm: f64,
    /// Result-material volume.
    pub volume_rm: f64,
}

impl LineView {
    /// Copies one visible line out of a projection.
    #[must_use]
    pub fn from_detail(detail: LineDetail<'_>) -> Self {
        Self {
            reaction_id: detail.reaction.id,
            title: detail.reaction.title.clone(),
            starting_material: detail.reaction.starting_material.clone(),
            result_material: detail.reaction.result_material.clone(),
            quantity: detail.line.quantity,
            volume_sm: detail.line.volume_sm,
            volume_rm: detail.line.volume_rm,
        }
    }
}

/// Read-only view of an order and its visible lines.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisView {
    /// The order identifier.
    pub synthesis_id: Uuid,
    /// Lifecycle status.
    pub status: SynthesisStatus,
    /// The creator.
    pub creator_id: Uuid,
    /// The deciding moderator, if any.
    pub moderator_id: Option<Uuid>,
    /// Purity in percent, if set.
    pub purity: Option<f64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// When a terminal status was reached.
    pub finished_at: Option<DateTime<Utc>>,
    /// Stored version.
    pub version: i64,
    /// Lines whose reaction is still in the catalog.
    pub lines: Vec<LineView>,
    /// Lines hidden because their reaction was deleted.
    pub hidden_lines: usize,
}

impl SynthesisView {
    /// Builds the view of `order` from its line projection.
    #[must_use]
    pub fn build(order: &SynthesisOrder, projection: &LineProjection) -> Self {
        let record = order.record();
        Self {
            synthesis_id: record.id,
            status: record.status,
            creator_id: record.creator_id,
            moderator_id: record.moderator_id,
            purity: record.purity,
            created_at: record.created_at,
            updated_at: record.updated_at,
            finished_at: record.finished_at,
            version: record.version,
            lines: projection
                .iter()
                .map(LineView::from_detail)
                .collect(),
            hidden_lines: projection.hidden_count(),
        }
    }
}

/// Listing entry for an order, without lines.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisSummaryView {
    /// The order identifier.
    pub synthesis_id: Uuid,
    /// Lifecycle status.
    pub status: SynthesisStatus,
    /// The creator.
    pub creator_id: Uuid,
    /// The deciding moderator, if any.
    pub moderator_id: Option<Uuid>,
    /// Purity in percent.
    pub purity: Option<f64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
    /// When a terminal status was reached.
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<SynthesisRecord> for SynthesisSummaryView {
    fn from(record: SynthesisRecord) -> Self {
        Self {
            synthesis_id: record.id,
            status: record.status,
            creator_id: record.creator_id,
            moderator_id: record.moderator_id,
            purity: record.purity,
            created_at: record.created_at,
            updated_at: record.updated_at,
            finished_at: record.finished_at,
        }
    }
}

/// The caller's current draft, if any.
#[derive(Debug, Clone, Serialize)]
pub struct DraftSummaryView {
    /// The draft's identifier.
    pub draft_id: Option<Uuid>,
    /// Number of visible lines in the draft.
    pub line_count: usize,
}

/// Optional criteria for [`list_syntheses`].
#[derive(Debug, Clone, Default)]
pub struct SynthesisQuery {
    /// Only orders in this status; `draft` and `deleted` are not listable.
    pub status: Option<SynthesisStatus>,
    /// Only orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Only orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,
}

/// Retrieves an order visible to the caller.
///
/// # Errors
///
/// Returns `DomainError::SynthesisNotFound` for a missing or deleted order
/// and `DomainError::Forbidden` if the caller is neither its creator nor a
/// moderator.
pub async fn get_synthesis(
    token: &VerifiedToken,
    synthesis_id: Uuid,
    ctx: &SynthesisContext<'_>,
) -> Result<SynthesisView, DomainError> {
    let caller = ctx.gate.admit(token).await?;
    let order = ctx.load_active(synthesis_id).await?;
    order.ensure_visible_to(&caller)?;
    ctx.view(&order).await
}

/// Returns the visible lines of an order joined with the catalog.
///
/// # Errors
///
/// As [`get_synthesis`].
pub async fn lines_with_details(
    token: &VerifiedToken,
    synthesis_id: Uuid,
    ctx: &SynthesisContext<'_>,
) -> Result<LineProjection, DomainError> {
    let caller = ctx.gate.admit(token).await?;
    let order = ctx.load_active(synthesis_id).await?;
    order.ensure_visible_to(&caller)?;
    ctx.project(&order).await
}

/// Lists submitted orders. Moderators see every creator's orders; anyone
/// else only their own.
///
/// # Errors
///
/// Returns `DomainError::Validation` when filtering by `draft` or `deleted`
/// or by an inverted date range.
pub async fn list_syntheses(
    token: &VerifiedToken,
    query: &SynthesisQuery,
    ctx: &SynthesisContext<'_>,
) -> Result<Vec<SynthesisSummaryView>, DomainError> {
    let caller = ctx.gate.admit(token).await?;

    if let Some(status @ (SynthesisStatus::Draft | SynthesisStatus::Deleted)) = query.status {
        return Err(DomainError::Validation(format!(
            "{status} orders are not listable"
        )));
    }
    if matches!((query.created_from, query.created_to), (Some(from), Some(to)) if from > to) {
        return Err(DomainError::Validation(
            "created_from must not be after created_to".to_owned(),
        ));
    }

    let filter = SynthesisFilter {
        creator_id: (!caller.is_moderator()).then_some(caller.user_id),
        status: query.status,
        created_from: query.created_from,
        created_to: query.created_to,
    };
    let records = bounded(ctx.timeout, "synthesis list", ctx.orders.list(&filter)).await?;
    Ok(records.into_iter().map(SynthesisSummaryView::from).collect())
}

/// Returns the caller's draft id and its visible line count.
///
/// # Errors
///
/// Returns `DomainError::Unauthenticated` for a revoked token.
pub async fn draft_summary(
    token: &VerifiedToken,
    ctx: &SynthesisContext<'_>,
) -> Result<DraftSummaryView, DomainError> {
    let caller = ctx.gate.admit(token).await?;
    let draft = bounded(
        ctx.timeout,
        "draft lookup",
        ctx.orders.find_draft(caller.user_id),
    )
    .await?;

    match draft {
        Some(order) => {
            let projection = ctx.project(&order).await?;
            Ok(DraftSummaryView {
                draft_id: Some(order.id()),
                line_count: projection.visible_count(),
            })
        }
        None => Ok(DraftSummaryView {
            draft_id: None,
            line_count: 0,
        }),
    }
}
