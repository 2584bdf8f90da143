//! Actions processed by the [`EntityStore`](crate::store::EntityStore).

use crate::error::ApiError;
use crate::model::{Truck, TruckId};

/// Every state transition the store knows about.
///
/// `Request*` variants start a remote call; the store then dispatches the
/// matching result variant (`ListFetched`, `Updated`, ...) or a failure.
#[derive(Debug)]
pub enum Action {
    RequestList {
        limit: usize,
        offset: usize,
        order: String,
        filter: String,
    },
    ListFetched(Vec<Truck>),
    ListFetchFailed(ApiError),

    RequestCount { filter: String },
    CountFetched(u64),

    RequestUpdate(Truck),
    Updated(Truck),

    RequestInsert(Truck),
    Inserted(Truck),

    RequestDelete(TruckId),
    Deleted(TruckId),

    ActionFailed(ApiError),
}

impl Action {
    /// Stable name used in logs and change notifications.
    pub fn name(&self) -> &'static str {
        match self {
            Action::RequestList { .. } => "truck/request-list",
            Action::ListFetched(_) => "truck/list-fetched",
            Action::ListFetchFailed(_) => "truck/list-fetch-failed",
            Action::RequestCount { .. } => "truck/request-count",
            Action::CountFetched(_) => "truck/count-fetched",
            Action::RequestUpdate(_) => "truck/request-update",
            Action::Updated(_) => "truck/updated",
            Action::RequestInsert(_) => "truck/request-insert",
            Action::Inserted(_) => "truck/inserted",
            Action::RequestDelete(_) => "truck/request-delete",
            Action::Deleted(_) => "truck/deleted",
            Action::ActionFailed(_) => "truck/action-failed",
        }
    }
}
