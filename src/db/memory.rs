//! In-memory profile store, used when no database is configured.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

use uuid::Uuid;

use super::{OnConflict, ProfileStore, StoreError};
use crate::lock;
use crate::state::Profile;

#[derive(Default)]
pub struct MemoryProfileStore {
    rows: Mutex<HashMap<Uuid, Profile>>,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.rows).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn select_profile(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(lock(&self.rows).get(&id).cloned())
    }

    async fn upsert_profile(&self, record: &Profile, on_conflict: OnConflict) -> Result<Profile, StoreError> {
        let mut rows = lock(&self.rows);
        let stored = match rows.entry(record.id) {
            Entry::Occupied(mut slot) => match on_conflict {
                OnConflict::KeepExisting => slot.get().clone(),
                OnConflict::Overwrite => {
                    let created_at = slot.get().created_at;
                    slot.insert(Profile { created_at, ..record.clone() });
                    slot.get().clone()
                }
            },
            Entry::Vacant(slot) => slot.insert(record.clone()).clone(),
        };
        Ok(stored)
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
