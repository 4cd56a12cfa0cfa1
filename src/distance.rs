//! Great-circle distances between known locations.

use crate::problem::{normalize_location, CoordinateTable, Coordinates};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Haversine distance in miles between two coordinate pairs.
pub fn haversine_miles(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h marginally past 1 for antipodal points.
    2.0 * EARTH_RADIUS_MILES * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Distance lookups keyed by location identifier.
///
/// Unknown locations are infinitely far from every other location, so they
/// never cluster with anything. A location is always zero miles from itself.
#[derive(Debug, Clone, Copy)]
pub struct DistanceService<'a> {
    coordinates: &'a CoordinateTable,
}

impl<'a> DistanceService<'a> {
    /// Create a distance service over a coordinate table.
    pub fn new(coordinates: &'a CoordinateTable) -> Self {
        DistanceService { coordinates }
    }

    /// Distance in miles, or `f64::INFINITY` when either location is unknown.
    pub fn distance(&self, a: &str, b: &str) -> f64 {
        if normalize_location(a) == normalize_location(b) {
            return 0.0;
        }
        match (self.coordinates.get(a), self.coordinates.get(b)) {
            (Some(from), Some(to)) => haversine_miles(from, to),
            _ => f64::INFINITY,
        }
    }

    /// Distance from a raw coordinate pair to a location.
    pub fn distance_from(&self, from: Coordinates, location: &str) -> f64 {
        self.coordinates
            .get(location)
            .map_or(f64::INFINITY, |to| haversine_miles(from, to))
    }

    /// Coordinates of a location, if known.
    pub fn coordinates(&self, location: &str) -> Option<Coordinates> {
        self.coordinates.get(location)
    }
}
