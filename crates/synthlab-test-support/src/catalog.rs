//! In-memory catalog and image storage.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use synthlab_catalog::domain::reaction::{MaterialDescriptor, NewReaction, Reaction};
use synthlab_catalog::repository::{ImageStore, ReactionRepository};
use synthlab_core::error::DomainError;
use uuid::Uuid;

/// A valid reaction titled `title` with densities 1.0/2.0 and molar masses
/// 100/200.
///
/// # Panics
///
/// Panics if `title` is blank.
#[must_use]
pub fn sample_reaction(title: &str) -> Reaction {
    Reaction::create(
        Uuid::new_v4(),
        NewReaction {
            title: title.to_owned(),
            details: format!("{title} details"),
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
    .unwrap()
}

/// A reaction repository backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct InMemoryReactionRepository {
    reactions: Mutex<HashMap<Uuid, Reaction>>,
}

impl InMemoryReactionRepository {
    /// Stores `reaction` as-is, bypassing validation.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn insert(&self, reaction: Reaction) {
        self.reactions.lock().unwrap().insert(reaction.id, reaction);
    }

    /// Returns the stored entry, deleted or not.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn stored(&self, reaction_id: Uuid) -> Option<Reaction> {
        self.reactions.lock().unwrap().get(&reaction_id).cloned()
    }
}

#[async_trait]
impl ReactionRepository for InMemoryReactionRepository {
    async fn get(&self, reaction_id: Uuid) -> Result<Reaction, DomainError> {
        self.stored(reaction_id)
            .filter(|r| !r.is_deleted)
            .ok_or(DomainError::ReactionNotFound(reaction_id))
    }

    async fn exists(&self, reaction_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.stored(reaction_id).is_some_and(|r| !r.is_deleted))
    }

    async fn get_including_deleted(
        &self,
        reaction_id: Uuid,
    ) -> Result<Option<Reaction>, DomainError> {
        Ok(self.stored(reaction_id))
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

    async fn search(&self, title: Option<&str>) -> Result<Vec<Reaction>, DomainError> {
        let needle = title.map(str::to_lowercase);
        let mut found: Vec<Reaction> = self
            .reactions
            .lock()
            .unwrap()
            .values()
            .filter(|r| !r.is_deleted)
            .filter(|r| {
                needle
                    .as_deref()
                    .is_none_or(|n| r.title.to_lowercase().contains(n))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn save(&self, reaction: &Reaction) -> Result<(), DomainError> {
        self.insert(reaction.clone());
        Ok(())
    }
}

/// An image store that keeps objects in memory.
#[derive(Debug, Default)]
pub struct InMemoryImageStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    /// When set, every `put` fails with an infrastructure error.
    pub fail_puts: AtomicBool,
}

impl InMemoryImageStore {
    /// Names of the objects currently stored, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn object_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn put(
        &self,
        object_name: &str,
        _content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<String, DomainError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(DomainError::Infrastructure("bucket unavailable".into()));
        }
        self.objects
            .lock()
            .unwrap()
            .insert(object_name.to_owned(), bytes);
        Ok(object_name.to_owned())
    }

    fn public_url(&self, reference: &str) -> String {
        format!("http://images.test/{reference}")
    }

    async fn remove(&self, reference: &str) -> Result<(), DomainError> {
        self.objects.lock().unwrap().remove(reference);
        Ok(())
    }
}
