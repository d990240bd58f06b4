//! Persistence port for synthesis orders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use synthlab_core::error::DomainError;
use uuid::Uuid;

use crate::domain::aggregates::{SynthesisOrder, SynthesisRecord};
use crate::domain::status::SynthesisStatus;

/// Criteria for listing submitted orders. Drafts and deleted orders are never
/// listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisFilter {
    /// Only orders created by this user.
    pub creator_id: Option<Uuid>,
    /// Only orders in this status.
    pub status: Option<SynthesisStatus>,
    /// Only orders created at or after this instant.
    pub created_from: Option<DateTime<Utc>>,
    /// Only orders created at or before this instant.
    pub created_to: Option<DateTime<Utc>>,
}

impl SynthesisFilter {
    /// Returns `true` if `record` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, record: &SynthesisRecord) -> bool {
        !matches!(
            record.status,
            SynthesisStatus::Draft | SynthesisStatus::Deleted
        ) && self.creator_id.is_none_or(|id| id == record.creator_id)
            && self.status.is_none_or(|s| s == record.status)
            && self.created_from.is_none_or(|from| record.created_at >= from)
            && self.created_to.is_none_or(|to| record.created_at <= to)
    }
}

/// Storage for synthesis orders and their lines.
///
/// Implementations must make `find_or_create_draft`, `add_to_draft` and
/// `increment_line` single atomic units, and `save` a compare-and-swap on
/// `version`.
#[async_trait]
pub trait SynthesisRepository: Send + Sync {
    /// Returns the creator's draft, inserting `candidate` if they have none.
    /// At most one draft per creator can ever exist.
    async fn find_or_create_draft(
        &self,
        candidate: &SynthesisOrder,
    ) -> Result<SynthesisOrder, DomainError>;

    /// Finds or creates the creator's draft and adds one unit of
    /// `reaction_id` to it, as one unit. Returns the draft's id.
    ///
    /// An order that stops being a draft before the line lands is never
    /// written to; the line goes to a fresh draft instead. Returns
    /// `DomainError::ReactionNotFound` if the reaction is absent or deleted
    /// at write time, in which case no draft is created.
    async fn add_to_draft(
        &self,
        candidate: &SynthesisOrder,
        reaction_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Uuid, DomainError>;

    /// Adds one unit of `reaction_id` to the order: inserts a quantity-1 line
    /// or increments the existing one.
    ///
    /// Returns `DomainError::InvalidState` unless the order is a draft and
    /// `DomainError::ReactionNotFound` if the reaction is absent or deleted
    /// at write time. On error nothing is written.
    async fn increment_line(
        &self,
        synthesis_id: Uuid,
        reaction_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError>;

    /// Loads an order with all of its lines, whatever its status.
    ///
    /// Returns `DomainError::SynthesisNotFound` if it does not exist.
    async fn load(&self, synthesis_id: Uuid) -> Result<SynthesisOrder, DomainError>;

    /// Loads the creator's draft, if any.
    async fn find_draft(&self, creator_id: Uuid) -> Result<Option<SynthesisOrder>, DomainError>;

    /// Writes the order's scalar fields and replaces its lines, provided the
    /// stored version still equals `order.version()`. Returns the new
    /// version.
    ///
    /// Returns `DomainError::ConcurrencyConflict` if the stored version
    /// moved on, in which case nothing is written.
    async fn save(&self, order: &SynthesisOrder) -> Result<i64, DomainError>;

    /// Lists orders matching `filter`, newest first.
    async fn list(&self, filter: &SynthesisFilter) -> Result<Vec<SynthesisRecord>, DomainError>;
}
