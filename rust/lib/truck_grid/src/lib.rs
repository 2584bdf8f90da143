//! Truck grid — keeps a paginated, sortable, filterable table in sync with
//! a remote truck collection.
//!
//! # Pieces
//!
//! - [`EntityStore`] — keyed in-memory page of trucks, driven by [`Action`]s.
//!   Request actions call the remote [`TruckService`]; their outcomes are
//!   reduced into [`TruckState`]. Failures go to the [`ErrorReporter`].
//! - [`GridAdapter`] — the table's data source: `load`, `update`, `insert`,
//!   `remove` and the `on_*` lifecycle hooks.
//! - [`query`] — sort/filter translation to the service's transport strings.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use truck_grid::*;
//!
//! let service = Arc::new(HttpTruckService::new("http://localhost:8080", "trucks"));
//! let store = EntityStore::new(service, Arc::new(TracingReporter));
//! let grid = GridAdapter::new(store, Arc::new(NoRefresh));
//!
//! let page = grid
//!     .load(&LoadOptions::page(25, 0).with_sort(SortSpec::desc("number")))
//!     .await?;
//! grid.on_loaded();
//! ```

pub mod action;
pub mod adapter;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod reporter;
pub mod service;
pub mod state;
pub mod store;
pub mod subscription;

// Re-export primary types at crate root.
pub use action::Action;
pub use adapter::{GridAdapter, GridRefresh, InsertResult, LoadResult, NoRefresh, UpdateResult};
pub use client::HttpTruckService;
pub use config::{ConfigError, GridConfig};
pub use error::{ApiError, GridError};
pub use model::{Truck, TruckId};
pub use query::{Comparison, FilterExpr, LoadOptions, SortSpec, translate_filter, translate_sort};
pub use reporter::{ErrorReporter, TracingReporter};
pub use service::TruckService;
pub use state::{GridData, TruckState};
pub use store::{Dispatch, EntityStore};
pub use subscription::{Subscription, SubscriptionId};
