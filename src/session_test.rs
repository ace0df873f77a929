use super::*;
use crate::identity::LocalIdentityProvider;
use crate::state::test_helpers::sample_session;

struct FailingProvider;

#[async_trait::async_trait]
impl IdentityProvider for FailingProvider {
    async fn get_session(&self) -> Result<Option<Session>, IdentityError> {
        Err(IdentityError::SessionFetch("network down".into()))
    }

    fn on_auth_state_change(&self) -> AuthSubscription {
        crate::identity::ListenerRegistry::new().subscribe()
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        Err(IdentityError::SignOut("network down".into()))
    }
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn generation_starts_at_zero() {
    assert_eq!(Generation::default().value(), 0);
}

#[test]
fn generation_display_is_plain_number() {
    assert_eq!(Generation(7).to_string(), "7");
}

// =============================================================================
// SessionStore transitions
// =============================================================================

#[test]
fn new_store_is_loading_without_session() {
    let store = SessionStore::new();
    assert!(store.is_loading());
    assert!(store.session().is_none());
    assert_eq!(store.generation(), Generation::default());
}

#[test]
fn transition_bumps_generation_and_clears_loading() {
    let mut store = SessionStore::new();
    let session = sample_session();

    let generation = store.transition(Some(session.clone()));

    assert_eq!(generation.value(), 1);
    assert_eq!(store.generation(), generation);
    assert_eq!(store.session(), Some(&session));
    assert!(!store.is_loading());
}

#[test]
fn transition_to_none_still_bumps_generation() {
    let mut store = SessionStore::new();
    store.transition(Some(sample_session()));
    let generation = store.transition(None);

    assert_eq!(generation.value(), 2);
    assert!(store.session().is_none());
}

#[test]
fn generations_strictly_increase() {
    let mut store = SessionStore::new();
    let mut previous = store.generation();
    for _ in 0..5 {
        let next = store.transition(Some(sample_session()));
        assert!(next > previous);
        previous = next;
    }
}

#[test]
fn settle_initial_commits_when_nothing_happened() {
    let mut store = SessionStore::new();
    let requested = store.generation();
    let session = sample_session();

    let generation = store.settle_initial(requested, Some(session.clone()));

    assert_eq!(generation, Some(Generation(1)));
    assert_eq!(store.session(), Some(&session));
}

#[test]
fn settle_initial_discarded_after_event() {
    let mut store = SessionStore::new();
    let requested = store.generation();
    let from_event = sample_session();
    store.transition(Some(from_event.clone()));

    let generation = store.settle_initial(requested, None);

    assert!(generation.is_none());
    assert_eq!(store.session(), Some(&from_event));
    assert_eq!(store.generation().value(), 1);
}

// =============================================================================
// Provider calls
// =============================================================================

#[tokio::test]
async fn get_initial_returns_provider_session() {
    let session = sample_session();
    let provider = LocalIdentityProvider::with_session(session.clone());
    assert_eq!(SessionStore::get_initial(&provider).await, Some(session));
}

#[tokio::test]
async fn get_initial_error_is_treated_as_signed_out() {
    assert!(SessionStore::get_initial(&FailingProvider).await.is_none());
}

#[tokio::test]
async fn sign_out_passes_provider_error_through() {
    let err = SessionStore::sign_out(&FailingProvider).await.unwrap_err();
    assert_eq!(err.error_code(), "E_SIGN_OUT");
}

#[tokio::test]
async fn on_change_registers_listener() {
    let provider = LocalIdentityProvider::new();
    let subscription = SessionStore::on_change(&provider);
    assert_eq!(provider.listener_count(), 1);
    subscription.unsubscribe();
    assert_eq!(provider.listener_count(), 0);
}
