//! Reference data for one optimization run: coordinates, freight rates and
//! the order snapshot.
//!
//! The tables are built once when a run starts and are read-only afterwards.

use crate::order::Order;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// Create a new coordinate pair.
    pub fn new(lat: f64, lon: f64) -> Self {
        Coordinates { lat, lon }
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((lat, lon): (f64, f64)) -> Self {
        Coordinates { lat, lon }
    }
}

/// Normalize a location identifier for table lookups.
///
/// Identifiers are trimmed and upper-cased. ZIP-like values (digits with an
/// optional `-NNNN` extension) are reduced to their first five digits and
/// zero-padded, so `"501"` becomes `"00501"` and `"30301-1234"` becomes
/// `"30301"`.
pub fn normalize_location(raw: &str) -> String {
    let trimmed = raw.trim();
    let base = match trimmed.split_once('-') {
        Some((head, tail))
            if !head.is_empty()
                && head.chars().all(|c| c.is_ascii_digit())
                && tail.trim().chars().all(|c| c.is_ascii_digit()) =>
        {
            head
        }
        _ => trimmed,
    };

    if !base.is_empty() && base.chars().all(|c| c.is_ascii_digit()) {
        let padded = format!("{:0>5}", base);
        return padded.chars().take(5).collect();
    }

    base.to_ascii_uppercase()
}

/// Immutable location → coordinates lookup.
///
/// Missing entries are tolerated; callers receive `None` and decide on a
/// fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinateTable {
    entries: HashMap<String, Coordinates>,
}

impl CoordinateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        CoordinateTable::default()
    }

    /// Add or replace the coordinates of a location.
    pub fn insert(&mut self, location: &str, coords: impl Into<Coordinates>) {
        self.entries.insert(normalize_location(location), coords.into());
    }

    /// Builder-style variant of [`CoordinateTable::insert`].
    pub fn with(mut self, location: &str, coords: impl Into<Coordinates>) -> Self {
        self.insert(location, coords);
        self
    }

    /// Look up the coordinates of a location.
    pub fn get(&self, location: &str) -> Option<Coordinates> {
        self.entries.get(&normalize_location(location)).copied()
    }

    /// Check whether the location is known.
    pub fn contains(&self, location: &str) -> bool {
        self.get(location).is_some()
    }

    /// Number of known locations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>, C: Into<Coordinates>> FromIterator<(S, C)> for CoordinateTable {
    fn from_iter<I: IntoIterator<Item = (S, C)>>(iter: I) -> Self {
        let mut table = CoordinateTable::new();
        for (location, coords) in iter {
            table.insert(location.as_ref(), coords);
        }
        table
    }
}

/// One row of the freight rate matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneRate {
    pub origin: String,
    pub region: String,
    pub rate_per_mile: f64,
}

/// Immutable (origin, destination region) → dollars-per-mile lookup.
#[derive(Debug, Clone, Default)]
pub struct RateTable {
    lanes: BTreeMap<(String, String), f64>,
}

impl RateTable {
    /// Create an empty rate table.
    pub fn new() -> Self {
        RateTable::default()
    }

    /// Build a table from rate rows.
    ///
    /// Rows with an empty origin or region, or a non-positive rate, are
    /// skipped. When a lane appears twice the first row wins.
    pub fn from_rates<'a>(rates: impl IntoIterator<Item = &'a LaneRate>) -> Self {
        let mut table = RateTable::new();
        for rate in rates {
            let key = Self::key(&rate.origin, &rate.region);
            if key.0.is_empty() || key.1.is_empty() {
                continue;
            }
            if !(rate.rate_per_mile.is_finite() && rate.rate_per_mile > 0.0) {
                continue;
            }
            table.lanes.entry(key).or_insert(rate.rate_per_mile);
        }
        table
    }

    /// Builder-style lane registration.
    pub fn with_lane(mut self, origin: &str, region: &str, rate_per_mile: f64) -> Self {
        self.lanes.insert(Self::key(origin, region), rate_per_mile);
        self
    }

    /// Rate for a lane, if one is on file.
    pub fn rate_for(&self, origin: &str, region: &str) -> Option<f64> {
        self.lanes.get(&Self::key(origin, region)).copied()
    }

    /// Number of lanes on file.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Check if no lanes are on file.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    fn key(origin: &str, region: &str) -> (String, String) {
        (normalize_location(origin), normalize_location(region))
    }
}

/// The in-memory snapshot a single optimization run works on.
///
/// Every run owns its own `Problem`; nothing in it is shared mutably between
/// runs.
#[derive(Debug, Clone)]
pub struct Problem {
    pub origin: String,
    pub orders: Vec<Order>,
    pub coordinates: CoordinateTable,
    pub rates: RateTable,
}

impl Problem {
    /// Create a new problem instance.
    pub fn new(
        origin: &str,
        orders: Vec<Order>,
        coordinates: CoordinateTable,
        rates: RateTable,
    ) -> Self {
        Problem {
            origin: normalize_location(origin),
            orders,
            coordinates,
            rates,
        }
    }

    /// Orders that may take part in optimization.
    pub fn eligible_orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| !order.excluded && !order.lines.is_empty())
            .cloned()
            .collect()
    }

    /// Orders that are not excluded but carry no lines.
    pub fn empty_orders(&self) -> Vec<Order> {
        self.orders
            .iter()
            .filter(|order| !order.excluded && order.lines.is_empty())
            .cloned()
            .collect()
    }

    /// Number of orders flagged as excluded.
    pub fn excluded_count(&self) -> usize {
        self.orders.iter().filter(|order| order.excluded).count()
    }

    /// Coordinates of the origin, if known.
    pub fn origin_coordinates(&self) -> Option<Coordinates> {
        self.coordinates.get(&self.origin)
    }
}
