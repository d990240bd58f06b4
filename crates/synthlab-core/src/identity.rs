//! Caller identity as resolved from a verified bearer token.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role carried by a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A regular user who assembles and submits syntheses.
    User,
    /// A privileged user who moderates formed syntheses and manages the catalog.
    Moderator,
}

/// The authenticated caller of a use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// The user's identifier.
    pub user_id: Uuid,
    /// The user's role.
    pub role: Role,
}

impl CallerIdentity {
    /// Creates an identity for a regular user.
    #[must_use]
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::User,
        }
    }

    /// Creates an identity for a moderator.
    #[must_use]
    pub fn moderator(user_id: Uuid) -> Self {
        Self {
            user_id,
            role: Role::Moderator,
        }
    }

    /// Returns `true` if the caller holds the moderator role.
    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}
