//! In-memory collaborators for facade tests.
//!
//! `synthlab-test-support` depends on this crate, so its adapters cannot be
//! used here and are mirrored instead.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use synthlab_auth::revocation::{RevocationGate, RevocationStore};
use synthlab_auth::token::{TokenCodec, VerifiedToken};
use synthlab_catalog::domain::reaction::{MaterialDescriptor, NewReaction, Reaction};
use synthlab_catalog::repository::ReactionRepository;
use synthlab_core::clock::Clock;
use synthlab_core::error::DomainError;
use synthlab_core::identity::CallerIdentity;
use uuid::Uuid;

use crate::application::context::SynthesisContext;
use crate::domain::aggregates::{SynthesisOrder, SynthesisRecord};
use crate::domain::status::SynthesisStatus;
use crate::repository::{SynthesisFilter, SynthesisRepository};

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
}

#[derive(Debug)]
pub(crate) struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryCatalog {
    reactions: Mutex<HashMap<Uuid, Reaction>>,
}

#[async_trait]
impl ReactionRepository for InMemoryCatalog {
    async fn get(&self, reaction_id: Uuid) -> Result<Reaction, DomainError> {
        self.reactions
            .lock()
            .unwrap()
            .get(&reaction_id)
            .filter(|r| !r.is_deleted)
            .cloned()
            .ok_or(DomainError::ReactionNotFound(reaction_id))
    }

    async fn exists(&self, reaction_id: Uuid) -> Result<bool, DomainError> {
        Ok(self
            .reactions
            .lock()
            .unwrap()
            .get(&reaction_id)
            .is_some_and(|r| !r.is_deleted))
    }

    async fn get_including_deleted(
        &self,
        reaction_id: Uuid,
    ) -> Result<Option<Reaction>, DomainError> {
        Ok(self.reactions.lock().unwrap().get(&reaction_id).cloned())
    }

    async fn find_active(&self, reaction_ids: &[Uuid]) -> Result<Vec<Reaction>, DomainError> {
        let reactions = self.reactions.lock().unwrap();
        Ok(reaction_ids
            .iter()
            .filter_map(|id| reactions.get(id))
            .filter(|r| !r.is_deleted)
            .cloned()
            .collect())
    }

    async fn search(&self, _title: Option<&str>) -> Result<Vec<Reaction>, DomainError> {
        Ok(self
            .reactions
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.is_deleted)
            .cloned()
            .collect())
    }

    async fn save(&self, reaction: &Reaction) -> Result<(), DomainError> {
        self.reactions
            .lock()
            .unwrap()
            .insert(reaction.id, reaction.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct InMemoryOrders {
    orders: Mutex<HashMap<Uuid, SynthesisOrder>>,
    pub(crate) fail_saves: AtomicBool,
}

impl InMemoryOrders {
    pub(crate) fn put(&self, order: SynthesisOrder) {
        self.orders.lock().unwrap().insert(order.id(), order);
    }

    pub(crate) fn get(&self, synthesis_id: Uuid) -> SynthesisOrder {
        self.orders.lock().unwrap()[&synthesis_id].clone()
    }

    pub(crate) fn drafts_of(&self, creator_id: Uuid) -> usize {
        self.orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.creator_id() == creator_id && o.status() == SynthesisStatus::Draft)
            .count()
    }
}

#[async_trait]
impl SynthesisRepository for InMemoryOrders {
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
        self.orders
            .lock()
            .unwrap()
            .get(&synthesis_id)
            .cloned()
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

#[derive(Debug, Default)]
pub(crate) struct InMemoryRevocations {
    keys: Mutex<HashSet<String>>,
}

#[async_trait]
impl RevocationStore for InMemoryRevocations {
    async fn is_revoked(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.keys.lock().unwrap().contains(key))
    }

    async fn revoke(&self, key: &str, _expires_at: DateTime<Utc>) -> Result<(), DomainError> {
        self.keys.lock().unwrap().insert(key.to_owned());
        Ok(())
    }
}

pub(crate) struct Harness {
    pub(crate) clock: FixedClock,
    pub(crate) catalog: InMemoryCatalog,
    pub(crate) orders: InMemoryOrders,
    pub(crate) gate: RevocationGate,
    codec: TokenCodec,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_revocations(Arc::new(InMemoryRevocations::default()))
    }

    pub(crate) fn with_revocations(store: Arc<dyn RevocationStore>) -> Self {
        Self {
            clock: FixedClock(fixed_now()),
            catalog: InMemoryCatalog::default(),
            orders: InMemoryOrders::default(),
            gate: RevocationGate::new(store, std::time::Duration::from_millis(100)),
            codec: TokenCodec::new(b"secret", "synthlab", Duration::hours(1)),
        }
    }

    pub(crate) fn ctx(&self) -> SynthesisContext<'_> {
        SynthesisContext {
            clock: &self.clock,
            gate: &self.gate,
            orders: &self.orders,
            catalog: &self.catalog,
            timeout: std::time::Duration::from_millis(100),
        }
    }

    pub(crate) fn token(&self, identity: CallerIdentity) -> VerifiedToken {
        let issued = self.codec.issue(identity, &self.clock).unwrap();
        self.codec.verify(&issued.access_token, &self.clock).unwrap()
    }

    pub(crate) fn add_reaction(&self, title: &str) -> Reaction {
        let reaction = Reaction::create(
            Uuid::new_v4(),
            NewReaction {
                title: title.to_owned(),
                details: String::new(),
                starting_material: MaterialDescriptor {
                    name: "source".into(),
                    density: 1.0,
                    molar_mass: 100.0,
                },
                result_material: MaterialDescriptor {
                    name: "product".into(),
                    density: 2.0,
                    molar_mass: 200.0,
                },
            },
        )
        .unwrap();
        self.catalog
            .reactions
            .lock()
            .unwrap()
            .insert(reaction.id, reaction.clone());
        reaction
    }

    pub(crate) fn soft_delete_reaction(&self, reaction_id: Uuid) {
        if let Some(r) = self.catalog.reactions.lock().unwrap().get_mut(&reaction_id) {
            r.mark_deleted();
        }
    }

    pub(crate) fn restore_reaction(&self, reaction_id: Uuid) {
        if let Some(r) = self.catalog.reactions.lock().unwrap().get_mut(&reaction_id) {
            r.restore();
        }
    }

    pub(crate) fn corrupt_reaction(&self, reaction_id: Uuid) {
        if let Some(r) = self.catalog.reactions.lock().unwrap().get_mut(&reaction_id) {
            r.result_material.density = 0.0;
        }
    }

    pub(crate) fn draft_with_lines(&self, creator_id: Uuid, reaction_ids: &[Uuid]) -> SynthesisOrder {
        let mut order = SynthesisOrder::new_draft(Uuid::new_v4(), creator_id, fixed_now());
        for id in reaction_ids {
            order.add_line(*id, fixed_now()).unwrap();
        }
        order.mark_saved(1);
        self.orders.put(order.clone());
        order
    }

    pub(crate) fn formed_order(&self, creator_id: Uuid, reaction_id: Uuid) -> SynthesisOrder {
        let mut order = SynthesisOrder::new_draft(Uuid::new_v4(), creator_id, fixed_now());
        order.add_line(reaction_id, fixed_now()).unwrap();
        order.set_line_volume(reaction_id, 10.0, fixed_now()).unwrap();
        order.set_purity(50.0, fixed_now()).unwrap();
        order
            .form(&CallerIdentity::user(creator_id), fixed_now())
            .unwrap();
        order.mark_saved(1);
        self.orders.put(order.clone());
        order
    }
}
