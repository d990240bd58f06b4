//! Order lines joined with their catalog entries.

use std::collections::HashMap;

use synthlab_catalog::domain::reaction::Reaction;
use synthlab_catalog::repository::ReactionRepository;
use synthlab_core::error::DomainError;
use tracing::warn;
use uuid::Uuid;

use crate::domain::aggregates::{OrderLine, SynthesisOrder};

/// One visible line with its reaction.
#[derive(Debug, Clone, Copy)]
pub struct LineDetail<'a> {
    /// The catalog entry.
    pub reaction: &'a Reaction,
    /// The stored line.
    pub line: &'a OrderLine,
}

/// The lines of one order paired with their active catalog entries.
///
/// Lines whose reaction has been soft-deleted are kept but not yielded by
/// [`iter`](Self::iter); the stored line is never touched.
#[derive(Debug, Clone)]
pub struct LineProjection {
    lines: Vec<OrderLine>,
    reactions: HashMap<Uuid, Reaction>,
}

impl LineProjection {
    /// Loads the active catalog entries referenced by `order`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the catalog cannot be read.
    pub async fn load(
        order: &SynthesisOrder,
        catalog: &dyn ReactionRepository,
    ) -> Result<Self, DomainError> {
        let ids: Vec<Uuid> = order.lines().iter().map(|l| l.reaction_id).collect();
        let reactions = if ids.is_empty() {
            HashMap::new()
        } else {
            catalog
                .find_active(&ids)
                .await?
                .into_iter()
                .map(|r| (r.id, r))
                .collect()
        };

        let projection = Self {
            lines: order.lines().to_vec(),
            reactions,
        };
        let hidden = projection.hidden_count();
        if hidden > 0 {
            warn!(synthesis_id = %order.id(), hidden, "lines reference deleted reactions");
        }
        Ok(projection)
    }

    /// Visible lines in insertion order. Each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = LineDetail<'_>> + '_ {
        self.lines.iter().filter_map(|line| {
            self.reactions
                .get(&line.reaction_id)
                .map(|reaction| LineDetail { reaction, line })
        })
    }

    /// Number of visible lines.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.iter().count()
    }

    /// Number of lines hidden because their reaction was deleted.
    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.lines.len() - self.visible_count()
    }
}
