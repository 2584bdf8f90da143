use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::oneshot;
use tracing::debug;

use crate::state::TruckState;

/// Callback type for state change notifications.
///
/// Receives the name of the action that was just reduced and the state
/// right after it.
pub type ChangeHandler = Arc<dyn Fn(&str, &TruckState) + Send + Sync>;

/// Unique handle for a listener registered with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

enum Listener {
    /// Called after every reducer step.
    Change(ChangeHandler),
    /// Fired once when one particular dispatch settles.
    Completion(oneshot::Sender<TruckState>),
}

/// Listener table shared by the store and every live [`Subscription`].
pub(crate) struct Listeners {
    entries: Mutex<HashMap<SubscriptionId, Listener>>,
    /// Monotonic counter for subscription IDs.
    next_id: AtomicU64,
}

impl Listeners {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<SubscriptionId, Listener>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(self: &Arc<Self>, listener: Listener) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries().insert(id, listener);
        Subscription {
            id,
            registry: Arc::downgrade(self),
            active: true,
        }
    }

    pub(crate) fn on_change(self: &Arc<Self>, handler: ChangeHandler) -> Subscription {
        self.register(Listener::Change(handler))
    }

    pub(crate) fn on_completion(self: &Arc<Self>) -> (Subscription, oneshot::Receiver<TruckState>) {
        let (tx, rx) = oneshot::channel();
        (self.register(Listener::Completion(tx)), rx)
    }

    /// Call every change handler. Handlers run outside the table lock so
    /// they may subscribe or release without deadlocking.
    pub(crate) fn notify_change(&self, action: &str, state: &TruckState) {
        let handlers: Vec<ChangeHandler> = self
            .entries()
            .values()
            .filter_map(|l| match l {
                Listener::Change(h) => Some(Arc::clone(h)),
                Listener::Completion(_) => None,
            })
            .collect();
        for handler in handlers {
            handler(action, state);
        }
    }

    /// Deliver a dispatch's final state and drop its completion listener.
    ///
    /// Returns `false` if the listener was already released.
    pub(crate) fn complete(&self, id: SubscriptionId, state: TruckState) -> bool {
        let listener = {
            let mut entries = self.entries();
            if matches!(entries.get(&id), Some(Listener::Completion(_))) {
                entries.remove(&id)
            } else {
                None
            }
        };
        match listener {
            Some(Listener::Completion(tx)) => tx.send(state).is_ok(),
            _ => false,
        }
    }

    fn remove(&self, id: SubscriptionId) -> bool {
        self.entries().remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().len()
    }
}

/// Registration of a listener with the store.
///
/// Released explicitly with [`release`](Self::release) or when dropped.
/// Releasing is idempotent: only the first call reports `true`.
#[must_use = "dropping a Subscription releases it immediately"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Listeners>,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Release the listener. Returns `true` on the first call only.
    pub fn release(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            let removed = registry.remove(self.id);
            debug!(id = self.id.0, removed, "released subscription");
        }
        true
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}
