//! In-memory synthesis order storage.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use synthlab_core::error::DomainError;
use synthlab_synthesis::domain::aggregates::{SynthesisOrder, SynthesisRecord};
use synthlab_synthesis::domain::status::SynthesisStatus;
use synthlab_synthesis::repository::{SynthesisFilter, SynthesisRepository};
use uuid::Uuid;

/// A synthesis repository backed by a `HashMap`. Every write bumps the
/// stored version, mirroring the `PostgreSQL` adapter.
#[derive(Debug, Default)]
pub struct InMemorySynthesisRepository {
    orders: Mutex<HashMap<Uuid, SynthesisOrder>>,
    /// When set, every `save` fails with an infrastructure error.
    pub fail_saves: AtomicBool,
}

impl InMemorySynthesisRepository {
    /// Stores `order` as-is, overwriting any previous copy.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, order: SynthesisOrder) {
        self.orders.lock().unwrap().insert(order.id(), order);
    }

    /// Returns the stored copy of an order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn stored(&self, synthesis_id: Uuid) -> Option<SynthesisOrder> {
        self.orders.lock().unwrap().get(&synthesis_id).cloned()
    }

    /// Number of drafts owned by `creator_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn draft_count(&self, creator_id: Uuid) -> usize {
        self.orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.creator_id() == creator_id && o.status() == SynthesisStatus::Draft)
            .count()
    }
}

#[async_trait]
impl SynthesisRepository for InMemorySynthesisRepository {
    async fn find_or_create_draft(
        &self,
        candidate: &SynthesisOrder,
    ) -> Result<SynthesisOrder, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        if let Some(existing) = orders.values().find(|o| {
            o.creator_id() == candidate.creator_id() && o.status() == SynthesisStatus::Draft
        }) {
            return Ok(existing.clone());
        }
        let mut created = candidate.clone();
        created.mark_saved(1);
        orders.insert(created.id(), created.clone());
        Ok(created)
    }

    async fn add_to_draft(
        &self,
        candidate: &SynthesisOrder,
        reaction_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Uuid, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let existing = orders
            .values()
            .find(|o| {
                o.creator_id() == candidate.creator_id() && o.status() == SynthesisStatus::Draft
            })
            .map(SynthesisOrder::id);
        let mut draft = match existing {
            Some(id) => orders[&id].clone(),
            None => {
                let mut created = candidate.clone();
                created.mark_saved(1);
                created
            }
        };
        draft.add_line(reaction_id, at)?;
        let next = draft.version() + 1;
        draft.mark_saved(next);
        let id = draft.id();
        orders.insert(id, draft);
        Ok(id)
    }

    async fn increment_line(
        &self,
        synthesis_id: Uuid,
        reaction_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders
            .get_mut(&synthesis_id)
            .ok_or(DomainError::SynthesisNotFound(synthesis_id))?;
        order.add_line(reaction_id, at)?;
        let next = order.version() + 1;
        order.mark_saved(next);
        Ok(())
    }

    async fn load(&self, synthesis_id: Uuid) -> Result<SynthesisOrder, DomainError> {
        self.stored(synthesis_id)
            .ok_or(DomainError::SynthesisNotFound(synthesis_id))
    }

    async fn find_draft(&self, creator_id: Uuid) -> Result<Option<SynthesisOrder>, DomainError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .find(|o| o.creator_id() == creator_id && o.status() == SynthesisStatus::Draft)
            .cloned())
    }

    async fn save(&self, order: &SynthesisOrder) -> Result<i64, DomainError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("connection reset".into()));
        }
        let mut orders = self.orders.lock().unwrap();
        let stored = orders
            .get(&order.id())
            .ok_or(DomainError::SynthesisNotFound(order.id()))?;
        if stored.version() != order.version() {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id: order.id(),
                expected: order.version(),
                actual: stored.version(),
            });
        }
        let mut saved = order.clone();
        saved.mark_saved(order.version() + 1);
        let version = saved.version();
        orders.insert(saved.id(), saved);
        Ok(version)
    }

    async fn list(&self, filter: &SynthesisFilter) -> Result<Vec<SynthesisRecord>, DomainError> {
        let mut records: Vec<SynthesisRecord> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .map(|o| o.record().clone())
            .filter(|r| filter.matches(r))
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}
