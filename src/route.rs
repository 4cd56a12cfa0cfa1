//! Stop sequencing for multi-stop loads.
//!
//! Routes are built from great-circle distances. Road routing is only used
//! for map display elsewhere and never influences sequencing.

use crate::distance::{haversine_miles, DistanceService};
use crate::problem::{normalize_location, Coordinates};
use crate::stack::EPSILON;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// A sequenced route from the origin through every stop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    /// Visiting order; unknown locations come last
    pub stops: Vec<String>,
    /// Sum of the legs between consecutive known stops, starting at the origin
    pub total_miles: f64,
    /// Direct distance from the origin to the farthest stop
    pub direct_miles: f64,
    /// `total_miles - direct_miles`, never negative
    pub detour_miles: f64,
    pub farthest_stop: Option<String>,
    /// Stops without coordinates; they add no miles
    pub unknown_stops: Vec<String>,
    pub origin_known: bool,
}

impl RouteResult {
    /// Number of distinct stops.
    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// Detour as a fraction of the direct distance.
    pub fn detour_fraction(&self) -> f64 {
        if self.direct_miles > 0.0 {
            self.detour_miles / self.direct_miles
        } else {
            0.0
        }
    }

    /// Detour as a percentage of the direct distance.
    pub fn detour_pct(&self) -> f64 {
        self.detour_fraction() * 100.0
    }

    /// Check whether the detour is above a fractional limit.
    pub fn exceeds_detour(&self, max_fraction: f64) -> bool {
        self.detour_fraction() > max_fraction + EPSILON
    }
}

/// Sequences stops with a nearest-neighbor heuristic.
#[derive(Debug, Clone, Copy)]
pub struct Router<'a> {
    distances: DistanceService<'a>,
    exact_stop_limit: Option<usize>,
}

impl<'a> Router<'a> {
    /// Create a nearest-neighbor router.
    pub fn new(distances: DistanceService<'a>) -> Self {
        Router {
            distances,
            exact_stop_limit: None,
        }
    }

    /// Evaluate every visiting order for loads with at most `limit` known
    /// stops.
    pub fn with_exact_stop_limit(mut self, limit: Option<usize>) -> Self {
        self.exact_stop_limit = limit;
        self
    }

    /// Route from `origin` through every destination.
    ///
    /// Duplicate destinations are visited once. Ties between equally near
    /// stops go to the smaller location identifier.
    pub fn route(&self, origin: &str, destinations: &[String]) -> RouteResult {
        let stops: Vec<String> = destinations
            .iter()
            .map(|stop| normalize_location(stop))
            .sorted()
            .dedup()
            .collect();

        let (known, unknown): (Vec<(String, Coordinates)>, Vec<String>) =
            stops.into_iter().fold((Vec::new(), Vec::new()), |(mut known, mut unknown), stop| {
                match self.distances.coordinates(&stop) {
                    Some(coords) => known.push((stop, coords)),
                    None => unknown.push(stop),
                }
                (known, unknown)
            });

        let Some(origin_coords) = self.distances.coordinates(origin) else {
            let mut all: Vec<String> = known.into_iter().map(|(stop, _)| stop).collect();
            all.extend(unknown.iter().cloned());
            return RouteResult {
                stops: all,
                unknown_stops: unknown,
                origin_known: false,
                ..RouteResult::default()
            };
        };

        let ordered = match self.exact_stop_limit {
            Some(limit) if known.len() > 1 && known.len() <= limit => {
                Self::exhaustive(origin_coords, &known)
            }
            _ => Self::nearest_neighbor(origin_coords, &known),
        };

        let total_miles = Self::path_miles(origin_coords, &ordered);
        let (farthest_stop, direct_miles) = known
            .iter()
            .map(|(stop, coords)| (stop, haversine_miles(origin_coords, *coords)))
            .fold((None, 0.0_f64), |(best, best_miles), (stop, miles)| {
                if best.is_none() || miles > best_miles {
                    (Some(stop.clone()), miles)
                } else {
                    (best, best_miles)
                }
            });

        let mut sequence: Vec<String> = ordered.into_iter().map(|(stop, _)| stop).collect();
        sequence.extend(unknown.iter().cloned());

        RouteResult {
            stops: sequence,
            total_miles,
            direct_miles,
            detour_miles: (total_miles - direct_miles).max(0.0),
            farthest_stop,
            unknown_stops: unknown,
            origin_known: true,
        }
    }

    fn nearest_neighbor(
        origin: Coordinates,
        stops: &[(String, Coordinates)],
    ) -> Vec<(String, Coordinates)> {
        let mut remaining: Vec<(String, Coordinates)> = stops.to_vec();
        let mut ordered = Vec::with_capacity(stops.len());
        let mut current = origin;

        while !remaining.is_empty() {
            let mut best = 0;
            let mut best_miles = f64::INFINITY;
            for (idx, (_, coords)) in remaining.iter().enumerate() {
                let miles = haversine_miles(current, *coords);
                if miles < best_miles {
                    best = idx;
                    best_miles = miles;
                }
            }
            let next = remaining.remove(best);
            current = next.1;
            ordered.push(next);
        }

        ordered
    }

    fn exhaustive(
        origin: Coordinates,
        stops: &[(String, Coordinates)],
    ) -> Vec<(String, Coordinates)> {
        let mut best: Option<(f64, Vec<(String, Coordinates)>)> = None;

        for candidate in stops.iter().cloned().permutations(stops.len()) {
            let miles = Self::path_miles(origin, &candidate);
            let improves = best
                .as_ref()
                .map_or(true, |(best_miles, _)| miles + EPSILON < *best_miles);
            if improves {
                best = Some((miles, candidate));
            }
        }

        best.map(|(_, ordered)| ordered)
            .unwrap_or_else(|| stops.to_vec())
    }

    fn path_miles(origin: Coordinates, ordered: &[(String, Coordinates)]) -> f64 {
        let mut current = origin;
        let mut total = 0.0;
        for (_, coords) in ordered {
            total += haversine_miles(current, *coords);
            current = *coords;
        }
        total
    }
}
