//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A reaction is absent from the catalog or has been soft-deleted.
    #[error("reaction not found: {0}")]
    ReactionNotFound(Uuid),

    /// A synthesis order is absent or has been deleted.
    #[error("synthesis not found: {0}")]
    SynthesisNotFound(Uuid),

    /// An order has no line for the given reaction.
    #[error("reaction {reaction_id} is not part of synthesis {synthesis_id}")]
    LineNotFound {
        /// The order that was searched.
        synthesis_id: Uuid,
        /// The reaction whose line is missing.
        reaction_id: Uuid,
    },

    /// A user account does not exist.
    #[error("user not found: {0}")]
    UserNotFound(Uuid),

    /// A lifecycle transition is not permitted from the current status.
    #[error("illegal transition from {from} to {to}: {reason}")]
    IllegalTransition {
        /// Status the order was in.
        from: &'static str,
        /// Status that was requested.
        to: &'static str,
        /// Which guard failed.
        reason: String,
    },

    /// A line or purity mutation was attempted outside `draft`.
    #[error("synthesis {synthesis_id} is {status}; only drafts can be edited")]
    InvalidState {
        /// The order that was targeted.
        synthesis_id: Uuid,
        /// Its current status.
        status: &'static str,
    },

    /// A numeric input lies outside its permitted range.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller presented no token, an invalid token, or a revoked token.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The caller is authenticated but lacks the role or ownership required.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The result-volume formula could not be evaluated from catalog data.
    #[error("computation error: {0}")]
    Computation(String),

    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// An infrastructure/persistence error, including timeouts.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for the not-found family of errors.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ReactionNotFound(_)
                | Self::SynthesisNotFound(_)
                | Self::LineNotFound { .. }
                | Self::UserNotFound(_)
        )
    }
}
