use crate::error::ApiError;
use crate::model::{Truck, TruckId};

/// Remote truck service consumed by the store.
///
/// Every call is single-shot: the store never retries, and timeouts are
/// the implementation's concern.
#[async_trait::async_trait]
pub trait TruckService: Send + Sync + 'static {
    /// Fetch one page. `order` and `filter` are transport strings built by
    /// [`crate::query`]; either may be empty.
    async fn list_trucks(
        &self,
        limit: usize,
        offset: usize,
        order: &str,
        filter: &str,
    ) -> Result<Vec<Truck>, ApiError>;

    /// Count all rows matching `filter`.
    async fn count_trucks(&self, filter: &str) -> Result<u64, ApiError>;

    async fn update_truck(&self, truck: &Truck) -> Result<(), ApiError>;

    async fn insert_truck(&self, truck: &Truck) -> Result<(), ApiError>;

    async fn delete_truck(&self, id: TruckId) -> Result<(), ApiError>;
}
