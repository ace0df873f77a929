//! Identity-provider seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! The identity provider is an external collaborator. This module defines the
//! interface the rest of the crate depends on, the event channel used to
//! deliver auth-state changes, and an in-process provider used by the dev
//! binary and tests.

pub mod channel;
pub mod local;

use serde::Serialize;

use crate::session::Session;

pub use channel::{AuthSubscription, ListenerRegistry, SubscriptionHandle};
pub use local::LocalIdentityProvider;

// =============================================================================
// EVENTS
// =============================================================================

/// What the provider says happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthChangeKind {
    SignedIn,
    TokenRefreshed,
    UserUpdated,
    SignedOut,
    Expired,
}

/// A single auth-state transition pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthChangeKind,
    /// The session after the transition; `None` for sign-out and expiry.
    pub session: Option<Session>,
}

impl AuthEvent {
    #[must_use]
    pub fn signed_in(session: Session) -> Self {
        Self { kind: AuthChangeKind::SignedIn, session: Some(session) }
    }

    #[must_use]
    pub fn token_refreshed(session: Session) -> Self {
        Self { kind: AuthChangeKind::TokenRefreshed, session: Some(session) }
    }

    #[must_use]
    pub fn user_updated(session: Session) -> Self {
        Self { kind: AuthChangeKind::UserUpdated, session: Some(session) }
    }

    #[must_use]
    pub fn signed_out() -> Self {
        Self { kind: AuthChangeKind::SignedOut, session: None }
    }

    #[must_use]
    pub fn expired() -> Self {
        Self { kind: AuthChangeKind::Expired, session: None }
    }
}

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("session fetch failed: {0}")]
    SessionFetch(String),
    #[error("sign-out failed: {0}")]
    SignOut(String),
}

impl IdentityError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SessionFetch(_) => "E_SESSION_FETCH",
            Self::SignOut(_) => "E_SIGN_OUT",
        }
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Interface to the identity provider.
///
/// Credential entry (password, sign-up, OAuth) belongs to the provider's own
/// UI flow and is not part of this interface.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// One-shot read of the current session.
    async fn get_session(&self) -> Result<Option<Session>, IdentityError>;

    /// Register for every subsequent transition, in arrival order.
    fn on_auth_state_change(&self) -> AuthSubscription;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), IdentityError>;
}
