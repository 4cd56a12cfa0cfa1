//! Geographic clustering and time-window splitting of orders.

use crate::distance::{haversine_miles, DistanceService};
use crate::order::Order;
use crate::problem::Coordinates;
use log::debug;
use serde::{Deserialize, Serialize};

/// Orders that are close enough to consider for one trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Index of the geographic cluster this group came from
    pub id: usize,
    pub orders: Vec<Order>,
    /// Mean position of the member orders; `None` for unknown locations
    pub centroid: Option<Coordinates>,
}

impl Cluster {
    fn seeded(id: usize, order: Order, centroid: Option<Coordinates>) -> Self {
        Cluster {
            id,
            orders: vec![order],
            centroid,
        }
    }

    /// Number of orders in the cluster.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the cluster is empty.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Ids of the member orders.
    pub fn order_ids(&self) -> Vec<&str> {
        self.orders.iter().map(|order| order.id.as_str()).collect()
    }

    /// Days between the earliest and latest due date.
    pub fn due_span_days(&self) -> i64 {
        due_span_days(&self.orders)
    }
}

/// Days between the earliest and latest due date of a set of orders.
pub fn due_span_days(orders: &[Order]) -> i64 {
    let min = orders.iter().map(|order| order.due_date).min();
    let max = orders.iter().map(|order| order.due_date).max();
    match (min, max) {
        (Some(min), Some(max)) => (max - min).num_days(),
        _ => 0,
    }
}

/// Stable processing order: due date, then order id.
pub fn sort_by_due_date(orders: &mut [Order]) {
    orders.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
}

/// Groups orders around running centroids.
pub struct GeoClusterer;

impl GeoClusterer {
    /// Cluster orders whose destinations lie within `radius_miles` of a
    /// cluster centroid.
    ///
    /// Orders are visited by due date then id. Each unclustered order seeds a
    /// new cluster; the remaining unclustered orders are then scanned once
    /// and absorbed when within the radius of the current centroid, which is
    /// updated as the mean of the member coordinates after every absorption.
    /// Orders without coordinates always form singleton clusters.
    pub fn cluster(
        orders: &[Order],
        radius_miles: f64,
        distances: &DistanceService<'_>,
    ) -> Vec<Cluster> {
        let mut pending: Vec<Order> = orders.to_vec();
        sort_by_due_date(&mut pending);

        let coords: Vec<Option<Coordinates>> = pending
            .iter()
            .map(|order| distances.coordinates(&order.destination))
            .collect();
        let mut assigned = vec![false; pending.len()];
        let mut clusters = Vec::new();

        for seed in 0..pending.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;

            let id = clusters.len();
            let mut cluster = Cluster::seeded(id, pending[seed].clone(), coords[seed]);

            if let Some(mut centroid) = coords[seed] {
                let mut members = 1.0;
                for candidate in (seed + 1)..pending.len() {
                    if assigned[candidate] {
                        continue;
                    }
                    let Some(point) = coords[candidate] else {
                        continue;
                    };
                    if haversine_miles(centroid, point) <= radius_miles {
                        assigned[candidate] = true;
                        members += 1.0;
                        centroid = Coordinates::new(
                            centroid.lat + (point.lat - centroid.lat) / members,
                            centroid.lon + (point.lon - centroid.lon) / members,
                        );
                        cluster.orders.push(pending[candidate].clone());
                    }
                }
                cluster.centroid = Some(centroid);
            }

            debug!(
                "Cluster {} seeded by order {} holds {} order(s)",
                id,
                pending[seed].id,
                cluster.len()
            );
            clusters.push(cluster);
        }

        clusters
    }
}

/// Splits clusters so that every group respects a due-date window.
pub struct TimeWindowFilter;

impl TimeWindowFilter {
    /// Split a cluster into buckets whose due-date span is at most
    /// `window_days`.
    ///
    /// The earliest-due unassigned order anchors each bucket, which takes
    /// every remaining order due within `window_days` of the anchor. Every
    /// order lands in exactly one bucket; buckets keep the cluster id.
    pub fn split(cluster: &Cluster, window_days: u32) -> Vec<Cluster> {
        let mut orders = cluster.orders.clone();
        sort_by_due_date(&mut orders);

        let mut buckets: Vec<Cluster> = Vec::new();
        let mut current: Vec<Order> = Vec::new();

        for order in orders {
            let within_window = current.first().map_or(true, |anchor| {
                (order.due_date - anchor.due_date).num_days() <= i64::from(window_days)
            });

            if !within_window {
                buckets.push(Self::bucket(cluster, std::mem::take(&mut current)));
            }
            current.push(order);
        }

        if !current.is_empty() {
            buckets.push(Self::bucket(cluster, current));
        }

        buckets
    }

    fn bucket(cluster: &Cluster, orders: Vec<Order>) -> Cluster {
        Cluster {
            id: cluster.id,
            orders,
            centroid: cluster.centroid,
        }
    }
}
