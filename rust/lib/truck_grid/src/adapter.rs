//! Grid data source backed by the [`EntityStore`].
//!
//! The grid calls `load`/`update`/`insert`/`remove`, consumes the result,
//! then calls the matching `on_*` hook. Each operation parks the
//! subscription of its dispatch until that hook releases it; a newer call
//! of the same operation replaces (and so releases) an older one that
//! never saw its hook.
//!
//! # Known gap
//!
//! `update`, `insert` and `remove` resolve as soon as the store settles,
//! whether the remote call succeeded or not. A failure only reaches the
//! user through the [`ErrorReporter`](crate::reporter::ErrorReporter);
//! the grid is never told. Compare the store state if the outcome matters.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::action::Action;
use crate::error::GridError;
use crate::model::{Truck, TruckId};
use crate::query::{LoadOptions, sort_trucks, translate_filter, translate_sort};
use crate::state::{TruckState, trucks_array};
use crate::store::EntityStore;
use crate::subscription::Subscription;

/// The table's own refresh, triggered after updates and inserts so the
/// merged row becomes visible to the table's local cache.
pub trait GridRefresh: Send + Sync + 'static {
    fn refresh(&self);
}

/// For front-ends that re-render on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRefresh;

impl GridRefresh for NoRefresh {
    fn refresh(&self) {}
}

/// Result of `load`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub data: Vec<Truck>,
    pub total_count: u64,
}

/// Result of `update`: the grid's key plus the store state after settling.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateResult {
    pub key: TruckId,
    pub result: TruckState,
}

/// Result of `insert`: the values the grid submitted, not a server identity.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertResult {
    pub value: Truck,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Load,
    Update,
    Insert,
    Remove,
}

#[derive(Default)]
struct Pending {
    load: Option<Subscription>,
    update: Option<Subscription>,
    insert: Option<Subscription>,
    remove: Option<Subscription>,
}

impl Pending {
    fn slot(&mut self, op: Operation) -> &mut Option<Subscription> {
        match op {
            Operation::Load => &mut self.load,
            Operation::Update => &mut self.update,
            Operation::Insert => &mut self.insert,
            Operation::Remove => &mut self.remove,
        }
    }
}

pub struct GridAdapter {
    store: EntityStore,
    refresher: Arc<dyn GridRefresh>,
    pending: Mutex<Pending>,
}

impl GridAdapter {
    pub fn new(store: EntityStore, refresher: Arc<dyn GridRefresh>) -> Self {
        Self {
            store,
            refresher,
            pending: Mutex::new(Pending::default()),
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    // ====================================================================
    // Data-source operations
    // ====================================================================

    /// Load one page.
    ///
    /// The count and the list requests start together and are not ordered
    /// against each other, so `total_count` may belong to another filter
    /// than `data` when loads overlap.
    pub async fn load(&self, options: &LoadOptions) -> Result<LoadResult, GridError> {
        let filter = translate_filter(options.filter.as_ref());
        let order = translate_sort(options.sort.as_ref());
        debug!(take = options.take, skip = options.skip, %order, %filter, "grid load");

        self.store
            .dispatch(Action::RequestCount { filter: filter.clone() })
            .detach();
        let list = self.store.dispatch(Action::RequestList {
            limit: options.take,
            offset: options.skip,
            order,
            filter,
        });

        let (state, subscription) = list.settled().await?;
        self.park(Operation::Load, subscription);

        let mut data = trucks_array(&state);
        if let Some(sort) = &options.sort {
            sort_trucks(&mut data, sort);
        }
        Ok(LoadResult {
            data,
            total_count: state.total,
        })
    }

    pub async fn update(&self, key: TruckId, values: Truck) -> Result<UpdateResult, GridError> {
        let (state, subscription) = self
            .store
            .dispatch(Action::RequestUpdate(values))
            .settled()
            .await?;
        self.park(Operation::Update, subscription);
        Ok(UpdateResult { key, result: state })
    }

    pub async fn insert(&self, values: Truck) -> Result<InsertResult, GridError> {
        let (_, subscription) = self
            .store
            .dispatch(Action::RequestInsert(values.clone()))
            .settled()
            .await?;
        self.park(Operation::Insert, subscription);
        Ok(InsertResult { value: values })
    }

    pub async fn remove(&self, key: &Truck) -> Result<(), GridError> {
        let (_, subscription) = self
            .store
            .dispatch(Action::RequestDelete(key.id))
            .settled()
            .await?;
        self.park(Operation::Remove, subscription);
        Ok(())
    }

    /// Save a row edited outside the grid (e.g. in a detail dialog).
    pub async fn save_row(&self, edited: Truck) -> Result<UpdateResult, GridError> {
        self.update(edited.id, edited).await
    }

    // ====================================================================
    // Lifecycle hooks
    // ====================================================================

    /// Returns `true` if a load subscription was released.
    pub fn on_loaded(&self) -> bool {
        self.release(Operation::Load)
    }

    pub fn on_updated(&self) -> bool {
        let released = self.release(Operation::Update);
        self.refresher.refresh();
        released
    }

    pub fn on_removed(&self) -> bool {
        self.release(Operation::Remove)
    }

    pub fn on_inserted(&self) -> bool {
        let released = self.release(Operation::Insert);
        self.refresher.refresh();
        released
    }

    /// Subscriptions parked and waiting for their hook.
    pub fn pending_hooks(&self) -> usize {
        let mut pending = self.pending();
        [Operation::Load, Operation::Update, Operation::Insert, Operation::Remove]
            .into_iter()
            .filter(|op| pending.slot(*op).is_some())
            .count()
    }

    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn park(&self, op: Operation, subscription: Subscription) {
        let previous = self.pending().slot(op).replace(subscription);
        if let Some(mut previous) = previous {
            // The grid never ran the hook for the older call.
            previous.release();
            debug!(?op, "superseded pending subscription released");
        }
    }

    fn release(&self, op: Operation) -> bool {
        let taken = self.pending().slot(op).take();
        match taken {
            Some(mut subscription) => subscription.release(),
            None => {
                debug!(?op, "hook called with no pending subscription");
                false
            }
        }
    }
}
