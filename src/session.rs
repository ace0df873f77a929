//! Authentication session tracking.
//!
//! DESIGN
//! ======
//! `SessionStore` is the only writer of the current `Session`. Every
//! transition bumps the `Generation` before anything downstream observes the
//! new session, so asynchronous work tagged with an older generation can tell
//! at commit time that it has been superseded.
//!
//! The store itself is plain state. It lives inside `AuthContext`'s lock so a
//! generation check and the commit it guards happen atomically.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::identity::{AuthSubscription, IdentityError, IdentityProvider};

// =============================================================================
// SESSION
// =============================================================================

/// Identity-provider-issued proof of authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Display name from provider user metadata; seeds the default profile.
    pub full_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

// =============================================================================
// GENERATION
// =============================================================================

/// Monotonic tag for successive session epochs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Generation(u64);

impl Generation {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Owner of the current session, its generation, and the session loading flag.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session: Option<Session>,
    generation: Generation,
    loading: bool,
}

impl SessionStore {
    /// A store that has not yet heard from the identity provider.
    #[must_use]
    pub fn new() -> Self {
        Self { session: None, generation: Generation::default(), loading: true }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True until the first session (or absence of one) has been committed.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Replace the current session and return the new generation.
    pub fn transition(&mut self, session: Option<Session>) -> Generation {
        self.generation = self.generation.next();
        self.session = session;
        self.loading = false;
        self.generation
    }

    /// Commit the one-shot initial session requested at `requested`.
    ///
    /// Returns `None` and leaves the store untouched if any transition has
    /// happened since the request was issued.
    pub fn settle_initial(&mut self, requested: Generation, session: Option<Session>) -> Option<Generation> {
        if self.generation != requested {
            return None;
        }
        Some(self.transition(session))
    }

    /// Fetch the provider's current session once.
    ///
    /// A failed fetch is treated as "signed out" and only reported in logs.
    pub async fn get_initial(provider: &dyn IdentityProvider) -> Option<Session> {
        match provider.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), "initial session fetch failed; treating as signed out");
                None
            }
        }
    }

    /// Subscribe to every subsequent provider transition.
    #[must_use]
    pub fn on_change(provider: &dyn IdentityProvider) -> AuthSubscription {
        provider.on_auth_state_change()
    }

    /// Ask the provider to end the session. Not retried on failure.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    pub async fn sign_out(provider: &dyn IdentityProvider) -> Result<(), IdentityError> {
        provider.sign_out().await
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
