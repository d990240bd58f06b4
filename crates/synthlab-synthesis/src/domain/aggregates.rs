//! The synthesis order aggregate.
//!
//! Every mutating method either applies completely or returns an error and
//! leaves the order untouched. Persisting the result, and detecting lost
//! races through `version`, is the repository's job.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use synthlab_core::error::DomainError;
use synthlab_core::identity::CallerIdentity;
use uuid::Uuid;

use crate::domain::lifecycle::{Transition, authorize};
use crate::domain::result_volume::{ReactionConstants, compute_result_volume};
use crate::domain::status::SynthesisStatus;

/// Scalar state of an order, as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Lifecycle status.
    pub status: SynthesisStatus,
    /// The user who assembled the order.
    pub creator_id: Uuid,
    /// The moderator who decided the order, once decided.
    pub moderator_id: Option<Uuid>,
    /// Purity in percent, once set.
    pub purity: Option<f64>,
    /// When the order was created.
    pub created_at: DateTime<Utc>,
    /// When the order last changed.
    pub updated_at: DateTime<Utc>,
    /// When the order reached a terminal status.
    pub finished_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency version; bumped on every save.
    pub version: i64,
}

/// One reaction within an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// The catalog reaction, which may since have been soft-deleted.
    pub reaction_id: Uuid,
    /// How many times the reaction was added. Never zero.
    pub quantity: u32,
    /// Starting-material volume set by the creator.
    pub volume_sm: f64,
    /// Result-material volume, set on completion.
    pub volume_rm: f64,
    /// When the line was first added.
    pub added_at: DateTime<Utc>,
}

impl OrderLine {
    /// A new line with quantity 1 and zero volumes.
    #[must_use]
    pub fn new(reaction_id: Uuid, added_at: DateTime<Utc>) -> Self {
        Self {
            reaction_id,
            quantity: 1,
            volume_sm: 0.0,
            volume_rm: 0.0,
            added_at,
        }
    }
}

/// Checks a purity percentage.
///
/// # Errors
///
/// Returns `DomainError::OutOfRange` unless `0 < purity <= 100`.
pub fn validate_purity(purity: f64) -> Result<(), DomainError> {
    if purity > 0.0 && purity <= 100.0 {
        Ok(())
    } else {
        Err(DomainError::OutOfRange(format!(
            "purity must be in (0, 100], got {purity}"
        )))
    }
}

/// A synthesis order and its lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOrder {
    record: SynthesisRecord,
    lines: Vec<OrderLine>,
}

impl SynthesisOrder {
    /// A fresh, empty draft for `creator_id`.
    #[must_use]
    pub fn new_draft(id: Uuid, creator_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            record: SynthesisRecord {
                id,
                status: SynthesisStatus::Draft,
                creator_id,
                moderator_id: None,
                purity: None,
                created_at: now,
                updated_at: now,
                finished_at: None,
                version: 0,
            },
            lines: Vec::new(),
        }
    }

    /// Rebuilds an order from stored state.
    #[must_use]
    pub fn restore(record: SynthesisRecord, lines: Vec<OrderLine>) -> Self {
        Self { record, lines }
    }

    /// The order's identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.record.id
    }

    /// The order's status.
    #[must_use]
    pub fn status(&self) -> SynthesisStatus {
        self.record.status
    }

    /// The order's creator.
    #[must_use]
    pub fn creator_id(&self) -> Uuid {
        self.record.creator_id
    }

    /// The stored version this state was loaded at.
    #[must_use]
    pub fn version(&self) -> i64 {
        self.record.version
    }

    /// Scalar state.
    #[must_use]
    pub fn record(&self) -> &SynthesisRecord {
        &self.record
    }

    /// All lines, including those whose reaction has been soft-deleted.
    #[must_use]
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the line for `reaction_id`, if present.
    #[must_use]
    pub fn line(&self, reaction_id: Uuid) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.reaction_id == reaction_id)
    }

    /// Records that a save succeeded at `version`.
    pub fn mark_saved(&mut self, version: i64) {
        self.record.version = version;
    }

    /// Fails with `Forbidden` unless `caller` created the order or is a
    /// moderator.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden`.
    pub fn ensure_visible_to(&self, caller: &CallerIdentity) -> Result<(), DomainError> {
        if caller.user_id == self.record.creator_id || caller.is_moderator() {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "synthesis {} belongs to another user",
                self.record.id
            )))
        }
    }

    /// Fails with `Forbidden` unless `caller` created the order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Forbidden`.
    pub fn ensure_owned_by(&self, caller: &CallerIdentity) -> Result<(), DomainError> {
        if caller.user_id == self.record.creator_id {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "only the creator may edit synthesis {}",
                self.record.id
            )))
        }
    }

    fn ensure_draft(&self) -> Result<(), DomainError> {
        if self.record.status == SynthesisStatus::Draft {
            Ok(())
        } else {
            Err(DomainError::InvalidState {
                synthesis_id: self.record.id,
                status: self.record.status.as_str(),
            })
        }
    }

    fn line_index(&self, reaction_id: Uuid) -> Result<usize, DomainError> {
        self.lines
            .iter()
            .position(|l| l.reaction_id == reaction_id)
            .ok_or(DomainError::LineNotFound {
                synthesis_id: self.record.id,
                reaction_id,
            })
    }

    /// Adds one unit of `reaction_id`: increments an existing line or appends
    /// a new one. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` unless the order is a draft.
    pub fn add_line(&mut self, reaction_id: Uuid, now: DateTime<Utc>) -> Result<u32, DomainError> {
        self.ensure_draft()?;
        let quantity = if let Ok(index) = self.line_index(reaction_id) {
            let line = &mut self.lines[index];
            line.quantity = line.quantity.saturating_add(1);
            line.quantity
        } else {
            self.lines.push(OrderLine::new(reaction_id, now));
            1
        };
        self.record.updated_at = now;
        Ok(quantity)
    }

    /// Sets the starting-material volume of one line.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` outside `draft`,
    /// `DomainError::LineNotFound` if the reaction is not in the order, and
    /// `DomainError::OutOfRange` for a negative or non-finite volume.
    pub fn set_line_volume(
        &mut self,
        reaction_id: Uuid,
        volume: f64,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_draft()?;
        if !volume.is_finite() || volume < 0.0 {
            return Err(DomainError::OutOfRange(format!(
                "volume must be a non-negative number, got {volume}"
            )));
        }
        let index = self.line_index(reaction_id)?;
        self.lines[index].volume_sm = volume;
        self.record.updated_at = now;
        Ok(())
    }

    /// Removes one unit of `reaction_id`, dropping the line when its quantity
    /// reaches zero. Returns the remaining quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` outside `draft` and
    /// `DomainError::LineNotFound` if the reaction is not in the order.
    pub fn remove_line(
        &mut self,
        reaction_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u32, DomainError> {
        self.ensure_draft()?;
        let index = self.line_index(reaction_id)?;
        let remaining = self.lines[index].quantity - 1;
        if remaining == 0 {
            self.lines.remove(index);
        } else {
            self.lines[index].quantity = remaining;
        }
        self.record.updated_at = now;
        Ok(remaining)
    }

    /// Sets the order's purity percentage.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidState` outside `draft` and
    /// `DomainError::OutOfRange` unless `0 < purity <= 100`.
    pub fn set_purity(&mut self, purity: f64, now: DateTime<Utc>) -> Result<(), DomainError> {
        self.ensure_draft()?;
        validate_purity(purity)?;
        self.record.purity = Some(purity);
        self.record.updated_at = now;
        Ok(())
    }

    /// `draft → formed`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`authorize`], `DomainError::OutOfRange` if
    /// purity is unset or out of range, and `DomainError::IllegalTransition`
    /// if the order has no lines.
    pub fn form(&mut self, caller: &CallerIdentity, now: DateTime<Utc>) -> Result<(), DomainError> {
        authorize(Transition::Form, self.record.status, caller, self.record.creator_id)?;

        let purity = self
            .record
            .purity
            .ok_or_else(|| DomainError::OutOfRange("purity has not been set".to_owned()))?;
        validate_purity(purity)?;
        if self.lines.is_empty() {
            return Err(DomainError::IllegalTransition {
                from: self.record.status.as_str(),
                to: SynthesisStatus::Formed.as_str(),
                reason: "the order has no reactions".to_owned(),
            });
        }

        self.record.status = SynthesisStatus::Formed;
        self.record.updated_at = now;
        Ok(())
    }

    /// `formed → completed`, computing every line's result volume from
    /// `constants` (keyed by reaction id).
    ///
    /// # Errors
    ///
    /// Returns the errors of [`authorize`] and `DomainError::Computation` if
    /// any line cannot be computed; in that case no line and no scalar field
    /// is changed.
    pub fn complete(
        &mut self,
        caller: &CallerIdentity,
        constants: &HashMap<Uuid, ReactionConstants>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        authorize(
            Transition::Complete,
            self.record.status,
            caller,
            self.record.creator_id,
        )?;

        let purity = self.record.purity.ok_or_else(|| {
            DomainError::Computation(format!("synthesis {} has no purity", self.record.id))
        })?;
        let volumes = self
            .lines
            .iter()
            .map(|line| {
                let reaction_constants = constants.get(&line.reaction_id).ok_or_else(|| {
                    DomainError::Computation(format!(
                        "no catalog record for reaction {}",
                        line.reaction_id
                    ))
                })?;
                compute_result_volume(purity, line.volume_sm, reaction_constants, line.quantity)
            })
            .collect::<Result<Vec<f64>, DomainError>>()?;

        for (line, volume) in self.lines.iter_mut().zip(volumes) {
            line.volume_rm = volume;
        }
        self.finish(SynthesisStatus::Completed, Some(caller.user_id), now);
        Ok(())
    }

    /// `formed → rejected`.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`authorize`].
    pub fn reject(&mut self, caller: &CallerIdentity, now: DateTime<Utc>) -> Result<(), DomainError> {
        authorize(
            Transition::Reject,
            self.record.status,
            caller,
            self.record.creator_id,
        )?;
        self.finish(SynthesisStatus::Rejected, Some(caller.user_id), now);
        Ok(())
    }

    /// `draft → deleted` or `formed → deleted`. A moderator deleting a formed
    /// order is recorded as its moderator.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`authorize`].
    pub fn delete(&mut self, caller: &CallerIdentity, now: DateTime<Utc>) -> Result<(), DomainError> {
        authorize(
            Transition::Delete,
            self.record.status,
            caller,
            self.record.creator_id,
        )?;
        let moderator = (self.record.status == SynthesisStatus::Formed).then_some(caller.user_id);
        self.finish(SynthesisStatus::Deleted, moderator, now);
        Ok(())
    }

    fn finish(&mut self, status: SynthesisStatus, moderator: Option<Uuid>, now: DateTime<Utc>) {
        self.record.status = status;
        if moderator.is_some() {
            self.record.moderator_id = moderator;
        }
        self.record.finished_at = Some(now);
        self.record.updated_at = now;
    }
}
