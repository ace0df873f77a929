//! Profile resolution — fetch, or lazily create a default profile.
//!
//! DESIGN
//! ======
//! Creation is a single upsert keyed by user id (`OnConflict::KeepExisting`),
//! never "check, then insert". Two near-simultaneous resolutions for the same
//! new user therefore still leave one row, even across client instances.
//!
//! Within one resolver, a per-user in-flight slot serializes resolutions for
//! the same id, so this instance never issues two concurrent writes for it.
//!
//! ERROR HANDLING
//! ==============
//! "No row" is not an error; it triggers creation. Fetch and write failures
//! are returned to the caller and are not retried here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{OnConflict, ProfileStore, StoreError};
use crate::lock;
use crate::session::Session;
use crate::state::Profile;

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("profile fetch failed: {0}")]
    Fetch(#[source] StoreError),
    #[error("profile write failed: {0}")]
    Write(#[source] StoreError),
}

impl ProfileError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "E_PROFILE_FETCH",
            Self::Write(_) => "E_PROFILE_WRITE",
        }
    }
}

type FlightSlot = Arc<tokio::sync::Mutex<()>>;

pub struct ProfileResolver {
    store: Arc<dyn ProfileStore>,
    in_flight: Mutex<HashMap<Uuid, FlightSlot>>,
}

impl ProfileResolver {
    #[must_use]
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store, in_flight: Mutex::new(HashMap::new()) }
    }

    /// Return the persisted profile for `session.user_id`, creating a default
    /// one if none exists.
    ///
    /// # Errors
    ///
    /// `ProfileError::Fetch` if the lookup fails, `ProfileError::Write` if the
    /// default profile cannot be written.
    pub async fn resolve(&self, session: &Session) -> Result<Profile, ProfileError> {
        let user_id = session.user_id;
        let slot = self.claim(user_id);
        let result = {
            let _guard = slot.lock().await;
            self.fetch_or_create(session).await
        };
        self.release(user_id, &slot);
        result
    }

    /// Persist an explicitly edited profile, replacing the stored row.
    ///
    /// # Errors
    ///
    /// `ProfileError::Write` if the upsert fails.
    pub async fn save(&self, record: &Profile) -> Result<Profile, ProfileError> {
        self.store
            .upsert_profile(record, OnConflict::Overwrite)
            .await
            .map_err(ProfileError::Write)
    }

    async fn fetch_or_create(&self, session: &Session) -> Result<Profile, ProfileError> {
        let user_id = session.user_id;
        if let Some(profile) = self
            .store
            .select_profile(user_id)
            .await
            .map_err(ProfileError::Fetch)?
        {
            debug!(user_id = %user_id, completed = profile.profile_completed, "profile found");
            return Ok(profile);
        }

        info!(user_id = %user_id, "no profile found; creating default profile");
        let record = Profile::new_default(session, OffsetDateTime::now_utc());
        self.store
            .upsert_profile(&record, OnConflict::KeepExisting)
            .await
            .map_err(ProfileError::Write)
    }

    fn claim(&self, user_id: Uuid) -> FlightSlot {
        Arc::clone(lock(&self.in_flight).entry(user_id).or_default())
    }

    fn release(&self, user_id: Uuid, slot: &FlightSlot) {
        let mut in_flight = lock(&self.in_flight);
        // EDGE: the map and this caller hold two references; more means a
        // queued resolution for the same user still needs the slot.
        if Arc::strong_count(slot) <= 2 {
            in_flight.remove(&user_id);
        }
    }
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
