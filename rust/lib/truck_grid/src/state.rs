//! Store state and the selectors derived from it.

use std::collections::HashMap;

use crate::model::{Truck, TruckId};

/// Page size used until the grid asks for something else.
pub const DEFAULT_LIMIT: usize = 25;

/// The store's single mutable aggregate.
///
/// `total` comes from the count request and is not tied to `trucks`: the
/// two requests of one grid load settle independently.
#[derive(Debug, Clone, PartialEq)]
pub struct TruckState {
    /// Current page, keyed by truck id.
    pub trucks: HashMap<TruckId, Truck>,
    pub limit: usize,
    pub offset: usize,
    pub order: Option<String>,
    pub filters: Option<String>,
    pub total: u64,
    pub loading: bool,
    pub loaded: bool,
}

impl TruckState {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            trucks: HashMap::new(),
            limit,
            offset: 0,
            order: None,
            filters: None,
            total: 0,
            loading: false,
            loaded: false,
        }
    }
}

impl Default for TruckState {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

/// Page data in the shape the grid consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    pub data: Vec<Truck>,
    pub total_count: u64,
}

// ── Selectors ───────────────────────────────────────────────────────

pub fn trucks_loaded(state: &TruckState) -> bool {
    state.loaded
}

/// Collection values in ascending id order.
pub fn trucks_array(state: &TruckState) -> Vec<Truck> {
    let mut trucks: Vec<Truck> = state.trucks.values().cloned().collect();
    trucks.sort_by_key(|t| t.id);
    trucks
}

pub fn grid_data(state: &TruckState) -> GridData {
    GridData {
        data: trucks_array(state),
        total_count: state.total,
    }
}
