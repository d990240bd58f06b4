//! Order status.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use synthlab_core::error::DomainError;

/// Where an order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisStatus {
    /// Being assembled by its creator. The only editable status.
    Draft,
    /// Submitted and awaiting moderation.
    Formed,
    /// Accepted by a moderator; result volumes are set.
    Completed,
    /// Declined by a moderator.
    Rejected,
    /// Logically removed.
    Deleted,
}

impl SynthesisStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Draft,
        Self::Formed,
        Self::Completed,
        Self::Rejected,
        Self::Deleted,
    ];

    /// The stored and serialized name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Formed => "formed",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Deleted => "deleted",
        }
    }

    /// `true` for statuses with no outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Deleted)
    }

    /// `true` for `draft` and `formed`.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for SynthesisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SynthesisStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown synthesis status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_status() {
        for status in SynthesisStatus::ALL {
            assert_eq!(status.as_str().parse::<SynthesisStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        assert!(matches!(
            "archived".parse::<SynthesisStatus>(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SynthesisStatus::Draft.is_active());
        assert!(SynthesisStatus::Formed.is_active());
        assert!(SynthesisStatus::Completed.is_terminal());
        assert!(SynthesisStatus::Rejected.is_terminal());
        assert!(SynthesisStatus::Deleted.is_terminal());
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SynthesisStatus::Formed).unwrap(),
            "\"formed\""
        );
    }
}
