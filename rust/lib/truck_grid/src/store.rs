use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::action::Action;
use crate::error::{ApiError, GridError};
use crate::reporter::{ERROR_TITLE, ErrorReporter};
use crate::service::TruckService;
use crate::state::TruckState;
use crate::subscription::{Listeners, Subscription};

/// Keyed in-memory truck collection driven by [`Action`]s.
///
/// - `dispatch(action)` runs the action chain on a spawned task and returns
///   a [`Dispatch`] handle that settles with the resulting state.
/// - `run(action)` runs the chain inline.
/// - `subscribe(handler)` observes every reducer step.
/// - `snapshot()` reads the current state.
///
/// Each reducer step runs under the state lock and is atomic. Remote
/// calls happen outside the lock, so the steps of independent dispatches
/// interleave freely: a count and a list fetch started together settle in
/// any order, and a stale list fetch that settles last overwrites the
/// page. Nothing is cancelled when superseded.
///
/// Cloning is cheap; clones share the same state.
#[derive(Clone)]
pub struct EntityStore {
    inner: Arc<Inner>,
}

struct Inner {
    state: RwLock<TruckState>,
    service: Arc<dyn TruckService>,
    reporter: Arc<dyn ErrorReporter>,
    listeners: Arc<Listeners>,
}

impl EntityStore {
    /// Create a store with the default initial state.
    pub fn new(service: Arc<dyn TruckService>, reporter: Arc<dyn ErrorReporter>) -> Self {
        Self::with_state(TruckState::default(), service, reporter)
    }

    pub fn with_state(
        state: TruckState,
        service: Arc<dyn TruckService>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(state),
                service,
                reporter,
                listeners: Listeners::new(),
            }),
        }
    }

    // ====================================================================
    // State — read
    // ====================================================================

    /// Clone of the current state.
    pub fn snapshot(&self) -> TruckState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the state without cloning it.
    pub fn select<R>(&self, f: impl FnOnce(&TruckState) -> R) -> R {
        let state = self.inner.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    // ====================================================================
    // Subscriptions
    // ====================================================================

    /// Observe every reducer step. The handler runs synchronously on the
    /// task that reduced the action.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&str, &TruckState) + Send + Sync + 'static,
    {
        self.inner.listeners.on_change(Arc::new(handler))
    }

    /// Number of listeners still registered (change + pending completions).
    pub fn live_subscriptions(&self) -> usize {
        self.inner.listeners.len()
    }

    // ====================================================================
    // Dispatch
    // ====================================================================

    /// Start processing `action` without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, action: Action) -> Dispatch {
        let (subscription, rx) = self.inner.listeners.on_completion();
        let id = subscription.id();
        let name = action.name();
        debug!(action = name, id = ?id, "dispatch");

        let store = self.clone();
        tokio::spawn(async move {
            let state = store.run(action).await;
            if !store.inner.listeners.complete(id, state) {
                debug!(action = name, id = ?id, "dispatch settled with no listener");
            }
        });

        Dispatch { subscription, rx }
    }

    /// Process `action` and every action it produces, then return the state.
    pub async fn run(&self, action: Action) -> TruckState {
        let mut next = Some(action);
        while let Some(action) = next {
            self.reduce(&action);
            next = self.effect(action).await;
        }
        self.snapshot()
    }

    /// Apply `action` to the state, then notify listeners and the reporter.
    fn reduce(&self, action: &Action) {
        let state = {
            let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
            match action {
                Action::RequestList { limit, offset, order, filter } => {
                    state.loading = true;
                    state.limit = *limit;
                    state.offset = *offset;
                    state.order = non_empty(order);
                    state.filters = non_empty(filter);
                }
                Action::ListFetched(trucks) => {
                    // Replace, never merge: the collection holds one page.
                    state.trucks = trucks.iter().map(|t| (t.id, t.clone())).collect();
                    state.loading = false;
                    state.loaded = true;
                }
                Action::ListFetchFailed(_) => {
                    state.loading = false;
                    state.loaded = false;
                }
                Action::CountFetched(n) => state.total = *n,
                Action::Updated(truck) | Action::Inserted(truck) => {
                    state.trucks.insert(truck.id, truck.clone());
                }
                Action::Deleted(id) => {
                    state.trucks.remove(id);
                }
                Action::RequestCount { .. }
                | Action::RequestUpdate(_)
                | Action::RequestInsert(_)
                | Action::RequestDelete(_)
                | Action::ActionFailed(_) => {}
            }
            state.clone()
        };

        self.inner.listeners.notify_change(action.name(), &state);

        if let Action::ListFetchFailed(err) | Action::ActionFailed(err) = action {
            self.inner.reporter.notify(ERROR_TITLE, err);
        }
    }

    /// Perform the remote call a request action stands for and return the
    /// action describing its outcome.
    async fn effect(&self, action: Action) -> Option<Action> {
        let service = &self.inner.service;
        let next = match action {
            Action::RequestList { limit, offset, order, filter } => {
                match service.list_trucks(limit, offset, &order, &filter).await {
                    Ok(trucks) => Action::ListFetched(trucks),
                    Err(err) => {
                        warn!(%err, limit, offset, "list fetch failed");
                        Action::ListFetchFailed(err)
                    }
                }
            }
            Action::RequestCount { filter } => settle(
                "count",
                service.count_trucks(&filter).await.map(Action::CountFetched),
            ),
            Action::RequestUpdate(truck) => settle(
                "update",
                service.update_truck(&truck).await.map(|()| Action::Updated(truck)),
            ),
            Action::RequestInsert(truck) => settle(
                "insert",
                service.insert_truck(&truck).await.map(|()| Action::Inserted(truck)),
            ),
            Action::RequestDelete(id) => settle(
                "delete",
                service.delete_truck(id).await.map(|()| Action::Deleted(id)),
            ),
            Action::ListFetched(_)
            | Action::ListFetchFailed(_)
            | Action::CountFetched(_)
            | Action::Updated(_)
            | Action::Inserted(_)
            | Action::Deleted(_)
            | Action::ActionFailed(_) => return None,
        };
        Some(next)
    }
}

fn settle(call: &str, outcome: Result<Action, ApiError>) -> Action {
    outcome.unwrap_or_else(|err| {
        warn!(%err, call, "truck service call failed");
        Action::ActionFailed(err)
    })
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

// ── Dispatch handle ─────────────────────────────────────────────────

/// Pending dispatch: a completion listener plus the channel it fires on.
///
/// Settles once the whole action chain has been reduced, whether the remote
/// call succeeded or not. Dropping the handle releases the listener but
/// does not cancel the action.
#[derive(Debug)]
pub struct Dispatch {
    subscription: Subscription,
    rx: oneshot::Receiver<TruckState>,
}

impl Dispatch {
    /// Wait for the action chain to finish and return the resulting state.
    ///
    /// Returns the subscription too: the caller decides when to release it.
    pub async fn settled(self) -> Result<(TruckState, Subscription), GridError> {
        let Dispatch { subscription, rx } = self;
        let state = rx.await.map_err(|_| GridError::Disconnected)?;
        Ok((state, subscription))
    }

    /// Stop listening; the action keeps running.
    pub fn detach(self) {
        let Dispatch { mut subscription, .. } = self;
        subscription.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::model::{Truck, TruckId};

    /// Service with canned answers; `fail` makes every call error.
    struct Canned {
        page: Vec<Truck>,
        count: u64,
        fail: bool,
    }

    impl Canned {
        fn ok(page: Vec<Truck>, count: u64) -> Arc<Self> {
            Arc::new(Self { page, count, fail: false })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { page: vec![], count: 0, fail: true })
        }

        fn check(&self) -> Result<(), ApiError> {
            if self.fail {
                Err(ApiError::Unavailable("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait::async_trait]
    impl TruckService for Canned {
        async fn list_trucks(&self, _: usize, _: usize, _: &str, _: &str) -> Result<Vec<Truck>, ApiError> {
            self.check().map(|()| self.page.clone())
        }
        async fn count_trucks(&self, _: &str) -> Result<u64, ApiError> {
            self.check().map(|()| self.count)
        }
        async fn update_truck(&self, _: &Truck) -> Result<(), ApiError> {
            self.check()
        }
        async fn insert_truck(&self, _: &Truck) -> Result<(), ApiError> {
            self.check()
        }
        async fn delete_truck(&self, _: TruckId) -> Result<(), ApiError> {
            self.check()
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, String)>>);

    impl ErrorReporter for Recorder {
        fn notify(&self, title: &str, error: &ApiError) {
            self.0.lock().unwrap().push((title.to_string(), error.to_string()));
        }
    }

    fn truck(id: TruckId, brand: &str) -> Truck {
        Truck { id, brand: brand.into(), ..Default::default() }
    }

    fn store_with(service: Arc<Canned>) -> (EntityStore, Arc<Recorder>) {
        let reporter = Arc::new(Recorder::default());
        (EntityStore::new(service, reporter.clone()), reporter)
    }

    // ========================================================================
    // List fetch
    // ========================================================================

    #[tokio::test]
    async fn list_fetch_replaces_collection() {
        let (store, _) = store_with(Canned::ok(vec![truck(3, "C"), truck(4, "D")], 0));
        store.run(Action::Inserted(truck(1, "A"))).await;

        let state = store
            .run(Action::RequestList { limit: 2, offset: 2, order: "brand".into(), filter: String::new() })
            .await;

        let mut ids: Vec<TruckId> = state.trucks.keys().copied().collect();
        ids.sort();
        assert_eq!(ids, vec![3, 4]);
        assert!(state.loaded);
        assert!(!state.loading);
        assert_eq!(state.limit, 2);
        assert_eq!(state.offset, 2);
        assert_eq!(state.order.as_deref(), Some("brand"));
        assert_eq!(state.filters, None);
    }

    #[tokio::test]
    async fn list_fetch_failure_resets_flags_and_reports() {
        let (store, reporter) = store_with(Canned::failing());
        store.run(Action::Inserted(truck(1, "A"))).await;

        let state = store
            .run(Action::RequestList { limit: 25, offset: 0, order: String::new(), filter: "a+=+1".into() })
            .await;

        assert!(!state.loading);
        assert!(!state.loaded);
        assert_eq!(state.filters.as_deref(), Some("a+=+1"));
        assert!(state.trucks.contains_key(&1));
        let reports = reporter.0.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].0, "Error");
    }

    #[tokio::test]
    async fn request_list_sets_loading_before_fetch() {
        let (store, _) = store_with(Canned::ok(vec![], 0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let _sub = store.subscribe(move |action, state| {
            s.lock().unwrap().push((action.to_string(), state.loading));
        });

        store
            .run(Action::RequestList { limit: 1, offset: 0, order: String::new(), filter: String::new() })
            .await;

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ("truck/request-list".to_string(), true),
                ("truck/list-fetched".to_string(), false),
            ]
        );
    }

    // ========================================================================
    // Single-entity mutations
    // ========================================================================

    #[tokio::test]
    async fn update_merges_one_key() {
        let (store, _) = store_with(Canned::ok(vec![truck(1, "A"), truck(2, "B")], 2));
        store
            .run(Action::RequestList { limit: 2, offset: 0, order: String::new(), filter: String::new() })
            .await;

        let state = store.run(Action::RequestUpdate(truck(2, "X"))).await;
        assert_eq!(state.trucks[&1].brand, "A");
        assert_eq!(state.trucks[&2].brand, "X");
        assert_eq!(state.trucks.len(), 2);
    }

    #[tokio::test]
    async fn insert_adds_key() {
        let (store, _) = store_with(Canned::ok(vec![], 0));
        let state = store.run(Action::RequestInsert(truck(9, "N"))).await;
        assert_eq!(state.trucks[&9].brand, "N");
    }

    #[tokio::test]
    async fn delete_removes_key_and_absent_is_noop() {
        let (store, _) = store_with(Canned::ok(vec![], 0));
        store.run(Action::Inserted(truck(1, "A"))).await;
        store.run(Action::Inserted(truck(2, "B"))).await;

        let state = store.run(Action::RequestDelete(1)).await;
        assert!(!state.trucks.contains_key(&1));

        let before = store.snapshot();
        let after = store.run(Action::RequestDelete(42)).await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn failed_mutation_reports_and_leaves_state() {
        let (store, reporter) = store_with(Canned::failing());
        store.run(Action::Inserted(truck(1, "A"))).await;
        let before = store.snapshot();

        store.run(Action::RequestUpdate(truck(1, "X"))).await;
        store.run(Action::RequestInsert(truck(2, "B"))).await;
        store.run(Action::RequestDelete(1)).await;
        store.run(Action::RequestCount { filter: String::new() }).await;

        assert_eq!(store.snapshot(), before);
        assert_eq!(reporter.0.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn mutations_never_touch_list_flags() {
        let (store, reporter) = store_with(Canned::ok(vec![truck(1, "A")], 1));
        let state = store
            .run(Action::RequestList { limit: 25, offset: 0, order: String::new(), filter: String::new() })
            .await;
        assert!(state.loaded);

        let flags = |s: &TruckState| (s.loading, s.loaded);
        for action in [
            Action::RequestUpdate(truck(1, "X")),
            Action::RequestInsert(truck(2, "B")),
            Action::RequestDelete(2),
            Action::RequestCount { filter: String::new() },
        ] {
            assert_eq!(flags(&store.run(action).await), (false, true));
        }

        // Same actions on a failing service: ActionFailed leaves the flags too.
        let failing = EntityStore::with_state(store.snapshot(), Canned::failing(), reporter.clone());
        for action in [
            Action::RequestUpdate(truck(1, "Y")),
            Action::RequestInsert(truck(3, "C")),
            Action::RequestDelete(1),
            Action::RequestCount { filter: String::new() },
        ] {
            assert_eq!(flags(&failing.run(action).await), (false, true));
        }
        assert_eq!(reporter.0.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn count_sets_total_without_touching_flags() {
        let (store, _) = store_with(Canned::ok(vec![], 17));
        let state = store.run(Action::RequestCount { filter: "a+=+1".into() }).await;
        assert_eq!(state.total, 17);
        assert!(!state.loading);
        assert!(!state.loaded);
        // The count request does not record the filter; only list fetches do.
        assert_eq!(state.filters, None);
    }

    // ========================================================================
    // Dispatch handles
    // ========================================================================

    #[tokio::test]
    async fn dispatch_settles_with_state_and_unregisters() {
        let (store, _) = store_with(Canned::ok(vec![truck(1, "A")], 1));
        let pending = store.dispatch(Action::RequestCount { filter: String::new() });
        assert_eq!(store.live_subscriptions(), 1);

        let (state, mut sub) = pending.settled().await.unwrap();
        assert_eq!(state.total, 1);
        assert_eq!(store.live_subscriptions(), 0);
        assert!(sub.release());
        assert!(!sub.release());
    }

    #[tokio::test]
    async fn detached_dispatch_still_runs() {
        let (store, _) = store_with(Canned::ok(vec![], 5));
        store.dispatch(Action::RequestCount { filter: String::new() }).detach();
        assert_eq!(store.live_subscriptions(), 0);

        // Wait for the spawned task through a second dispatch on the same runtime.
        let (state, _sub) = store
            .dispatch(Action::RequestCount { filter: String::new() })
            .settled()
            .await
            .unwrap();
        assert_eq!(state.total, 5);
    }
}
