//! Auth-event channel with explicit cancellation.
//!
//! DESIGN
//! ======
//! Each subscriber owns an unbounded receiver, so events are never coalesced
//! or dropped while the subscriber is live. The `SubscriptionHandle` removes
//! the listener from the registry when it is unsubscribed or dropped;
//! removal closes the receiver.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;

use super::AuthEvent;
use crate::lock;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    senders: BTreeMap<u64, mpsc::UnboundedSender<AuthEvent>>,
}

/// Provider-side list of live subscribers.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener.
    #[must_use]
    pub fn subscribe(&self) -> AuthSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut listeners = lock(&self.inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.senders.insert(id, tx);
        AuthSubscription { events: rx, handle: SubscriptionHandle { id, registry: Arc::downgrade(&self.inner) } }
    }

    /// Deliver `event` to every live listener. Returns how many received it.
    pub fn emit(&self, event: &AuthEvent) -> usize {
        let mut listeners = lock(&self.inner);
        listeners
            .senders
            .retain(|_, tx| tx.send(event.clone()).is_ok());
        listeners.senders.len()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).senders.len()
    }
}

/// Receiving end of a registration.
pub struct AuthSubscription {
    events: mpsc::UnboundedReceiver<AuthEvent>,
    handle: SubscriptionHandle,
}

impl AuthSubscription {
    /// Next event, or `None` once the listener has been removed.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        self.events.recv().await
    }

    /// Remove the listener. Buffered events are discarded.
    pub fn unsubscribe(self) {
        self.handle.unsubscribe();
    }
}

/// Cancellation token for a registered listener.
pub struct SubscriptionHandle {
    id: u64,
    registry: Weak<Mutex<Listeners>>,
}

impl SubscriptionHandle {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).senders.remove(&self.id);
        }
        self.registry = Weak::new();
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
#[path = "channel_test.rs"]
mod tests;
