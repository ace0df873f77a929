//! Auth context — session/profile synchronization.
//!
//! ARCHITECTURE
//! ============
//! `AuthContext` is built once at the application root and shared by `Arc`.
//! A driver task subscribes to the identity provider, runs the one-shot
//! initial session fetch concurrently with event delivery, and applies every
//! transition in arrival order. Each transition with a session spawns a
//! profile resolution tagged with the generation it started under.
//!
//! COMMIT RULES
//! ============
//! All mutable state sits behind one lock so a check and the commit it guards
//! are atomic. Before every commit:
//! - the context must still be active (teardown flips this first);
//! - a profile result must carry the current generation, else it is dropped.
//!
//! Teardown also aborts every spawned resolution, so none of them can write a
//! default profile to the store afterwards.
//!
//! ERROR HANDLING
//! ==============
//! Session fetch and profile resolution failures become an absent value plus a
//! log line; the gates always reach a terminal decision once loading clears.
//! Explicit actions (`sign_out`, `save_profile`) return their errors. A save
//! with no profile loaded reads the stored row first and fails rather than
//! overwrite it with a blank default.

use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::db::ProfileStore;
use crate::gate::{Gate, RouteDecision};
use crate::identity::{AuthEvent, IdentityError, IdentityProvider};
use crate::lock;
use crate::services::profile::{ProfileError, ProfileResolver};
use crate::session::{Generation, Session, SessionStore};
use crate::state::{CombinedState, Profile, ProfileUpdate};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no active session")]
    NotAuthenticated,
    #[error("auth context has been torn down")]
    Inactive,
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Profile(#[from] ProfileError),
}

impl AuthError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::Inactive => "E_INACTIVE",
            Self::Identity(e) => e.error_code(),
            Self::Profile(e) => e.error_code(),
        }
    }
}

struct Inner {
    sessions: SessionStore,
    profile: Option<Profile>,
    loading_profile: bool,
    active: bool,
}

impl Inner {
    fn snapshot(&self) -> CombinedState {
        CombinedState {
            session: self.sessions.session().cloned(),
            profile: self.profile.clone(),
            loading_session: self.sessions.is_loading(),
            loading_profile: self.loading_profile,
        }
    }

    /// Align profile state with a freshly committed session.
    fn prepare_profile(&mut self, session: Option<&Session>) {
        let Some(session) = session else {
            self.profile = None;
            self.loading_profile = false;
            return;
        };
        // EDGE: same user with a resolved profile revalidates in the
        // background; anything else waits for the new resolution.
        let usable = self
            .profile
            .as_ref()
            .is_some_and(|p| p.id == session.user_id);
        if !usable {
            self.profile = None;
            self.loading_profile = true;
        }
    }
}

// =============================================================================
// AUTH CONTEXT
// =============================================================================

pub struct AuthContext {
    identity: Arc<dyn IdentityProvider>,
    resolver: ProfileResolver,
    inner: Mutex<Inner>,
    snapshots: watch::Sender<CombinedState>,
    shutdown: Notify,
    driver: Mutex<Option<JoinHandle<()>>>,
    /// Spawned profile resolutions; aborted by `teardown`.
    resolutions: Mutex<Vec<JoinHandle<()>>>,
}

impl AuthContext {
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, profiles: Arc<dyn ProfileStore>) -> Arc<Self> {
        let inner = Inner { sessions: SessionStore::new(), profile: None, loading_profile: true, active: true };
        let (snapshots, _) = watch::channel(inner.snapshot());
        Arc::new(Self {
            identity,
            resolver: ProfileResolver::new(profiles),
            inner: Mutex::new(inner),
            snapshots,
            shutdown: Notify::new(),
            driver: Mutex::new(None),
            resolutions: Mutex::new(Vec::new()),
        })
    }

    /// Spawn the driver task. Calling it again is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut driver = lock(&self.driver);
        if driver.is_some() {
            warn!("auth context already started");
            return;
        }
        *driver = Some(tokio::spawn(Arc::clone(self).run()));
    }

    /// Current read-only snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CombinedState {
        self.snapshots.borrow().clone()
    }

    /// Receiver that observes every committed snapshot.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<CombinedState> {
        self.snapshots.subscribe()
    }

    /// Route decision for `gate` against the current snapshot.
    #[must_use]
    pub fn decide(&self, gate: Gate) -> RouteDecision {
        gate.decide(&self.snapshot())
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        lock(&self.inner).sessions.generation()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        lock(&self.inner).active
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Sign out through the provider, then clear session and profile.
    ///
    /// # Errors
    ///
    /// Returns the provider error; state is left untouched and the call is
    /// not retried.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        if !self.is_active() {
            return Err(AuthError::Inactive);
        }
        if let Err(e) = SessionStore::sign_out(self.identity.as_ref()).await {
            warn!(error = %e, "sign-out failed");
            return Err(e.into());
        }
        if let Some(generation) = self.commit_transition(None, None) {
            info!(%generation, "signed out");
        }
        Ok(())
    }

    /// Re-resolve the current user's profile.
    ///
    /// Returns `Ok(None)` when there is no session or the result was
    /// superseded by a newer session before it could be committed.
    ///
    /// # Errors
    ///
    /// Returns the resolution error after committing "no profile".
    pub async fn refresh_profile(&self) -> Result<Option<Profile>, AuthError> {
        let (generation, session) = {
            let mut inner = lock(&self.inner);
            if !inner.active {
                return Err(AuthError::Inactive);
            }
            let Some(session) = inner.sessions.session().cloned() else {
                return Ok(None);
            };
            inner.prepare_profile(Some(&session));
            self.publish(&inner);
            (inner.sessions.generation(), session)
        };

        match self.resolver.resolve(&session).await {
            Ok(profile) => {
                let committed = self.commit_profile(generation, Some(profile.clone()));
                Ok(committed.then_some(profile))
            }
            Err(e) => {
                error!(error = %e, code = e.error_code(), user_id = %session.user_id, "profile refresh failed");
                self.commit_profile(generation, None);
                Err(e.into())
            }
        }
    }

    /// Persist an explicit profile edit for the signed-in user.
    ///
    /// # Errors
    ///
    /// `AuthError::NotAuthenticated` without a session; `AuthError::Profile`
    /// if the stored row cannot be read or the write fails. Failed writes are
    /// not retried.
    pub async fn save_profile(&self, update: ProfileUpdate) -> Result<Profile, AuthError> {
        let (generation, session, current) = {
            let inner = lock(&self.inner);
            if !inner.active {
                return Err(AuthError::Inactive);
            }
            let session = inner
                .sessions
                .session()
                .cloned()
                .ok_or(AuthError::NotAuthenticated)?;
            let current = inner
                .profile
                .clone()
                .filter(|p| p.id == session.user_id);
            (inner.sessions.generation(), session, current)
        };

        // EDGE: nothing loaded (still resolving, or the fetch failed) means the
        // stored row is unknown; merge onto it, never onto a blank default.
        let base = match current {
            Some(profile) => profile,
            None => self.resolver.resolve(&session).await.map_err(|e| {
                warn!(error = %e, user_id = %session.user_id, "profile save aborted; stored profile unreadable");
                e
            })?,
        };
        let record = update.apply(base, OffsetDateTime::now_utc());
        let saved = self.resolver.save(&record).await.map_err(|e| {
            warn!(error = %e, user_id = %session.user_id, "profile save failed");
            e
        })?;
        info!(user_id = %saved.id, completed = saved.profile_completed, "profile saved");
        self.commit_profile(generation, Some(saved.clone()));
        Ok(saved)
    }

    /// Stop reacting to the provider and cancel in-flight resolutions. No
    /// commit or store write starts after this returns.
    pub async fn teardown(&self) {
        {
            let mut inner = lock(&self.inner);
            if !inner.active {
                return;
            }
            inner.active = false;
        }
        self.shutdown.notify_one();
        let driver = lock(&self.driver).take();
        if let Some(handle) = driver {
            if let Err(e) = handle.await {
                warn!(error = %e, "auth driver ended abnormally");
            }
        }
        let resolutions = std::mem::take(&mut *lock(&self.resolutions));
        for handle in &resolutions {
            handle.abort();
        }
        for handle in resolutions {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "profile resolution ended abnormally");
                }
            }
        }
        info!("auth context torn down");
    }

    // =========================================================================
    // DRIVER
    // =========================================================================

    async fn run(self: Arc<Self>) {
        // Subscribe before the initial fetch so no transition falls between.
        // Any event delivered after this point supersedes the initial result.
        let mut subscription = SessionStore::on_change(self.identity.as_ref());
        let initial = Arc::clone(&self).load_initial(self.generation());
        tokio::pin!(initial);
        let mut initial_pending = true;
        let mut events_open = true;

        // A closed event stream still lets the initial fetch settle, so the
        // session loading flag always clears.
        while events_open || initial_pending {
            tokio::select! {
                biased;
                () = self.shutdown.notified() => break,
                event = subscription.recv(), if events_open => match event {
                    Some(event) => self.handle_event(event),
                    None => {
                        warn!("identity provider closed the auth event stream");
                        events_open = false;
                    }
                },
                () = &mut initial, if initial_pending => initial_pending = false,
            }
        }

        subscription.unsubscribe();
        debug!("auth driver stopped");
    }

    async fn load_initial(self: Arc<Self>, requested: Generation) {
        let session = SessionStore::get_initial(self.identity.as_ref()).await;
        if self.handle_transition(session, Some(requested)).is_none() {
            debug!(%requested, "initial session superseded; discarded");
        }
    }

    fn handle_event(self: &Arc<Self>, event: AuthEvent) {
        info!(
            kind = ?event.kind,
            user_id = ?event.session.as_ref().map(|s| s.user_id),
            "auth state change"
        );
        self.handle_transition(event.session, None);
    }

    /// Commit a session transition and start resolving its profile.
    fn handle_transition(self: &Arc<Self>, session: Option<Session>, requested: Option<Generation>) -> Option<Generation> {
        let generation = self.commit_transition(session.as_ref(), requested)?;
        if let Some(session) = session {
            self.spawn_resolution(generation, session);
        }
        Some(generation)
    }

    /// Apply a transition under the lock. `requested` marks the initial fetch,
    /// which only lands if nothing has happened since it was issued.
    fn commit_transition(&self, session: Option<&Session>, requested: Option<Generation>) -> Option<Generation> {
        let mut inner = lock(&self.inner);
        if !inner.active {
            return None;
        }
        let generation = match requested {
            Some(requested) => inner
                .sessions
                .settle_initial(requested, session.cloned())?,
            None => inner.sessions.transition(session.cloned()),
        };
        inner.prepare_profile(session);
        self.publish(&inner);
        Some(generation)
    }

    fn spawn_resolution(self: &Arc<Self>, generation: Generation, session: Session) {
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let profile = match this.resolver.resolve(&session).await {
                Ok(profile) => Some(profile),
                Err(e) => {
                    error!(error = %e, code = e.error_code(), user_id = %session.user_id, "profile resolution failed");
                    None
                }
            };
            this.commit_profile(generation, profile);
        });
        let mut resolutions = lock(&self.resolutions);
        resolutions.retain(|h| !h.is_finished());
        resolutions.push(handle);
    }

    /// Commit a profile result started under `generation`. Returns whether it
    /// landed.
    fn commit_profile(&self, generation: Generation, profile: Option<Profile>) -> bool {
        let mut inner = lock(&self.inner);
        if !inner.active {
            debug!(%generation, "context inactive; profile result dropped");
            return false;
        }
        let current = inner.sessions.generation();
        if current != generation {
            info!(stale = %generation, %current, "discarding superseded profile result");
            return false;
        }
        inner.profile = profile;
        inner.loading_profile = false;
        self.publish(&inner);
        true
    }

    fn publish(&self, inner: &Inner) {
        self.snapshots.send_replace(inner.snapshot());
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
