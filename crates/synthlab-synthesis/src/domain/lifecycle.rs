//! The order state machine.
//!
//! | From     | To          | Who                 |
//! |----------|-------------|---------------------|
//! | `draft`  | `formed`    | creator             |
//! | `formed` | `completed` | moderator           |
//! | `formed` | `rejected`  | moderator           |
//! | `draft`  | `deleted`   | creator, moderator  |
//! | `formed` | `deleted`   | moderator           |
//!
//! Every other pair is an illegal transition. Data guards (purity, line
//! count, result volumes) are checked by the aggregate after this table.

use serde::{Deserialize, Serialize};
use synthlab_core::error::DomainError;
use synthlab_core::identity::CallerIdentity;
use uuid::Uuid;

use crate::domain::status::SynthesisStatus;

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Submit a draft for moderation.
    Form,
    /// Accept a formed order.
    Complete,
    /// Decline a formed order.
    Reject,
    /// Logically remove an active order.
    Delete,
}

impl Transition {
    /// The status the transition leads to.
    #[must_use]
    pub const fn target(self) -> SynthesisStatus {
        match self {
            Self::Form => SynthesisStatus::Formed,
            Self::Complete => SynthesisStatus::Completed,
            Self::Reject => SynthesisStatus::Rejected,
            Self::Delete => SynthesisStatus::Deleted,
        }
    }
}

/// A moderator's verdict on a formed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationDecision {
    /// Accept and compute result volumes.
    Complete,
    /// Decline.
    Reject,
}

impl From<ModerationDecision> for Transition {
    fn from(decision: ModerationDecision) -> Self {
        match decision {
            ModerationDecision::Complete => Self::Complete,
            ModerationDecision::Reject => Self::Reject,
        }
    }
}

enum Authority {
    Creator,
    Moderator,
    CreatorOrModerator,
}

fn required_authority(transition: Transition, from: SynthesisStatus) -> Option<Authority> {
    use SynthesisStatus::{Draft, Formed};

    match (from, transition) {
        (Draft, Transition::Form) => Some(Authority::Creator),
        (Formed, Transition::Complete | Transition::Reject | Transition::Delete) => {
            Some(Authority::Moderator)
        }
        (Draft, Transition::Delete) => Some(Authority::CreatorOrModerator),
        _ => None,
    }
}

/// Checks that `transition` is listed for `from` and that `caller` may
/// perform it on an order created by `creator_id`.
///
/// # Errors
///
/// Returns `DomainError::IllegalTransition` if the pair is not in the table
/// and `DomainError::Forbidden` if the caller lacks the role or ownership.
pub fn authorize(
    transition: Transition,
    from: SynthesisStatus,
    caller: &CallerIdentity,
    creator_id: Uuid,
) -> Result<(), DomainError> {
    let to = transition.target();
    let authority = required_authority(transition, from).ok_or_else(|| {
        DomainError::IllegalTransition {
            from: from.as_str(),
            to: to.as_str(),
            reason: if from.is_terminal() {
                format!("{from} is a terminal status")
            } else {
                format!("{to} is not reachable from {from}")
            },
        }
    })?;

    let is_creator = caller.user_id == creator_id;
    let allowed = match authority {
        Authority::Creator => is_creator,
        Authority::Moderator => caller.is_moderator(),
        Authority::CreatorOrModerator => is_creator || caller.is_moderator(),
    };
    if allowed {
        Ok(())
    } else {
        Err(DomainError::Forbidden(match authority {
            Authority::Creator => format!("only the creator may move a {from} order to {to}"),
            Authority::Moderator => format!("only a moderator may move a {from} order to {to}"),
            Authority::CreatorOrModerator => {
                format!("only the creator or a moderator may move a {from} order to {to}")
            }
        }))
    }
}
