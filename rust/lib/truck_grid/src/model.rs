//! Truck entity — the record shown in each grid row.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Numeric identity of a truck. Unique within the collection.
pub type TruckId = i64;

/// Columns the truck grid shows by default, in display order.
pub const DEFAULT_COLUMNS: [&str; 5] = ["number", "brand", "licencePlate", "chassis", "rental"];

/// A vehicle record as exchanged with the remote service and the grid.
///
/// Only `id` carries meaning for the store; the other fields are opaque
/// payload except when the grid asks for a client-side sort.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Truck {
    pub id: TruckId,
    #[serde(default)]
    pub number: i64,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub licence_plate: String,
    #[serde(default)]
    pub chassis: String,
    #[serde(default)]
    pub rental: bool,
}

impl Truck {
    /// Compare two trucks by a grid column selector.
    ///
    /// Returns `None` for a selector that names no column.
    pub fn compare_field(&self, other: &Truck, selector: &str) -> Option<Ordering> {
        let ord = match selector {
            "id" => self.id.cmp(&other.id),
            "number" => self.number.cmp(&other.number),
            "brand" => self.brand.cmp(&other.brand),
            "licencePlate" => self.licence_plate.cmp(&other.licence_plate),
            "chassis" => self.chassis.cmp(&other.chassis),
            "rental" => self.rental.cmp(&other.rental),
            _ => return None,
        };
        Some(ord)
    }
}
