//! In-process identity provider.
//!
//! Holds a single session in memory and pushes transitions to subscribers.
//! Expiry is never polled: `expire` is the push notification a real provider
//! would send.

use std::sync::Mutex;

use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use super::{AuthEvent, AuthSubscription, IdentityError, IdentityProvider, ListenerRegistry};
use crate::lock;
use crate::session::Session;

pub const DEFAULT_SESSION_TTL: Duration = Duration::hours(1);

pub struct LocalIdentityProvider {
    session: Mutex<Option<Session>>,
    listeners: ListenerRegistry,
    ttl: Duration,
}

impl LocalIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self { session: Mutex::new(None), listeners: ListenerRegistry::new(), ttl: DEFAULT_SESSION_TTL }
    }

    /// Start out already signed in, as a restored browser session would.
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let provider = Self::new();
        *lock(&provider.session) = Some(session);
        provider
    }

    /// Sign a user in and push `SignedIn`.
    pub fn sign_in(&self, user_id: Uuid, email: Option<String>, full_name: Option<String>) -> Session {
        let session = Session { user_id, email, full_name, expires_at: OffsetDateTime::now_utc() + self.ttl };
        *lock(&self.session) = Some(session.clone());
        let delivered = self
            .listeners
            .emit(&AuthEvent::signed_in(session.clone()));
        info!(user_id = %user_id, delivered, "local provider: signed in");
        session
    }

    /// Extend the current session and push `TokenRefreshed`.
    pub fn refresh_token(&self) -> Option<Session> {
        let refreshed = {
            let mut current = lock(&self.session);
            let session = current.as_mut()?;
            session.expires_at = OffsetDateTime::now_utc() + self.ttl;
            session.clone()
        };
        self.listeners
            .emit(&AuthEvent::token_refreshed(refreshed.clone()));
        Some(refreshed)
    }

    /// Change the signed-in user's display name and push `UserUpdated`.
    pub fn update_user(&self, full_name: Option<String>) -> Option<Session> {
        let updated = {
            let mut current = lock(&self.session);
            let session = current.as_mut()?;
            session.full_name = full_name;
            session.clone()
        };
        let delivered = self
            .listeners
            .emit(&AuthEvent::user_updated(updated.clone()));
        info!(user_id = %updated.user_id, delivered, "local provider: user updated");
        Some(updated)
    }

    /// Drop the session and push `Expired`.
    pub fn expire(&self) {
        *lock(&self.session) = None;
        let delivered = self.listeners.emit(&AuthEvent::expired());
        info!(delivered, "local provider: session expired");
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.listener_count()
    }
}

impl Default for LocalIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        Ok(lock(&self.session).clone())
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        self.listeners.subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        *lock(&self.session) = None;
        self.listeners.emit(&AuthEvent::signed_out());
        Ok(())
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
