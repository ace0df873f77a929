//! Shared state types.
//!
//! DESIGN
//! ======
//! `Profile` mirrors the `profiles` table. `CombinedState` is the single
//! snapshot the gates consume; while either loading flag is set its session and
//! profile may be stale and must not drive routing. `AppState` is injected into
//! Axum handlers via the `State` extractor.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::gate::GateStage;
use crate::identity::LocalIdentityProvider;
use crate::services::auth::AuthContext;
use crate::session::Session;

// =============================================================================
// PROFILE
// =============================================================================

/// Persisted per-user onboarding and interest data. At most one row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub college: Option<String>,
    pub graduation_year: Option<i32>,
    pub organizations: Option<String>,
    pub email_signature: Option<String>,
    pub companies_interested: Option<String>,
    pub roles_interested: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    /// Gates access between onboarding and the main application.
    pub profile_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    /// Minimal record written the first time a user has no profile.
    #[must_use]
    pub fn new_default(session: &Session, now: OffsetDateTime) -> Self {
        Self {
            id: session.user_id,
            full_name: Some(session.full_name.clone().unwrap_or_default()),
            email: session.email.clone(),
            phone: None,
            location: None,
            college: None,
            graduation_year: None,
            organizations: None,
            email_signature: None,
            companies_interested: None,
            roles_interested: None,
            avatar_url: None,
            bio: None,
            profile_completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Labels of required fields that are absent or blank.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let text = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("location", &self.location),
            ("college", &self.college),
            ("organizations", &self.organizations),
            ("email_signature", &self.email_signature),
            ("companies_interested", &self.companies_interested),
            ("roles_interested", &self.roles_interested),
        ];
        let mut missing: Vec<&'static str> = text
            .into_iter()
            .filter(|(_, value)| is_blank(value.as_deref()))
            .map(|(label, _)| label)
            .collect();
        if self.graduation_year.is_none() {
            missing.push("graduation_year");
        }
        missing
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

// =============================================================================
// PROFILE UPDATE
// =============================================================================

/// Payload of the explicit save action. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub college: Option<String>,
    pub graduation_year: Option<i32>,
    pub organizations: Option<String>,
    pub email_signature: Option<String>,
    pub companies_interested: Option<String>,
    pub roles_interested: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Merge onto `base`, trimming text. The result is marked completed exactly
    /// when no required field is left blank.
    #[must_use]
    pub fn apply(self, mut base: Profile, now: OffsetDateTime) -> Profile {
        merge(&mut base.full_name, self.full_name);
        merge(&mut base.email, self.email);
        merge(&mut base.phone, self.phone);
        merge(&mut base.location, self.location);
        merge(&mut base.college, self.college);
        merge(&mut base.organizations, self.organizations);
        merge(&mut base.email_signature, self.email_signature);
        merge(&mut base.companies_interested, self.companies_interested);
        merge(&mut base.roles_interested, self.roles_interested);
        merge(&mut base.avatar_url, self.avatar_url);
        merge(&mut base.bio, self.bio);
        if self.graduation_year.is_some() {
            base.graduation_year = self.graduation_year;
        }
        base.profile_completed = base.missing_required_fields().is_empty();
        base.updated_at = now;
        base
    }
}

fn merge(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *field = Some(value.trim().to_owned());
    }
}

// =============================================================================
// COMBINED STATE
// =============================================================================

/// Snapshot of everything the gates need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombinedState {
    pub session: Option<Session>,
    pub profile: Option<Profile>,
    pub loading_session: bool,
    pub loading_profile: bool,
}

impl CombinedState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading_session || self.loading_profile
    }

    /// Lifecycle stage, or `None` while loading.
    #[must_use]
    pub fn stage(&self) -> Option<GateStage> {
        GateStage::classify(self)
    }
}

impl Default for CombinedState {
    /// Nothing has been heard from the provider yet.
    fn default() -> Self {
        Self { session: None, profile: None, loading_session: true, loading_profile: true }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthContext>,
    /// Present only when dev routes are enabled; drives the local provider.
    pub local_identity: Option<Arc<LocalIdentityProvider>>,
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
