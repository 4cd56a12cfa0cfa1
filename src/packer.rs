//! Greedy assignment of whole orders to trailer loads.

use crate::cluster::Cluster;
use crate::compatibility::CompatibilityChecker;
use crate::config::{CompatibilityRules, OptimizationParams, TrailerType};
use crate::order::{Order, OrderLine};
use crate::solution::{CandidateLoad, LoadFlag, OversizedOrder};
use crate::stack::{min_linear_feet, StackPacker, EPSILON};
use crate::warning::{has_hard, Warning, WarningKind};
use log::{debug, warn};

/// Loads built from one cluster plus the orders that could not be placed.
#[derive(Debug, Clone, Default)]
pub struct PackOutcome {
    pub loads: Vec<CandidateLoad>,
    pub oversized: Vec<OversizedOrder>,
}

/// Packs orders into loads without ever splitting an order.
#[derive(Debug, Clone)]
pub struct GreedyPacker<'a> {
    capacity_ft: f64,
    trailer_type: TrailerType,
    checker: CompatibilityChecker<'a>,
}

impl<'a> GreedyPacker<'a> {
    /// Create a packer for the trailer described by `params`.
    pub fn new(params: &OptimizationParams, rules: &'a CompatibilityRules) -> Self {
        GreedyPacker {
            capacity_ft: params.trailer_capacity_ft,
            trailer_type: params.trailer_type,
            checker: CompatibilityChecker::new(rules),
        }
    }

    /// Trailer capacity used for acceptance.
    pub fn capacity_ft(&self) -> f64 {
        self.capacity_ft
    }

    /// Pack the orders of a cluster into loads.
    ///
    /// Orders are taken shortest first (own packed linear feet), then by due
    /// date and id. Each order is tried on the open load by re-packing the
    /// combined lines; it stays if the floor fits and no hard
    /// incompatibility appears, otherwise the open load is closed and the
    /// order opens the next one. Orders longer than the trailer are set
    /// aside as oversized.
    pub fn pack_cluster(&self, cluster: &Cluster) -> PackOutcome {
        let mut sized: Vec<(&Order, f64)> = cluster
            .orders
            .iter()
            .map(|order| (order, self.order_feet(order)))
            .collect();
        sized.sort_by(|(a, a_feet), (b, b_feet)| {
            a_feet
                .total_cmp(b_feet)
                .then_with(|| a.due_date.cmp(&b.due_date))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut outcome = PackOutcome::default();
        let mut current: Vec<Order> = Vec::new();
        let mut current_lines: Vec<OrderLine> = Vec::new();

        for (order, feet) in sized {
            if feet > self.capacity_ft + EPSILON {
                warn!(
                    "Order {} needs {:.1} ft of a {:.1} ft trailer; set aside for a split decision",
                    order.id, feet, self.capacity_ft
                );
                outcome.oversized.push(OversizedOrder {
                    order: order.clone(),
                    linear_feet: feet,
                    warning: Warning::hard(WarningKind::OversizedOrder {
                        order_id: order.id.clone(),
                        linear_feet: feet,
                        capacity_ft: self.capacity_ft,
                    }),
                });
                continue;
            }

            if !current.is_empty() {
                let mut combined = current_lines.clone();
                combined.extend(order.lines.iter().cloned());

                if self.accepts(&combined) {
                    current.push(order.clone());
                    current_lines = combined;
                    continue;
                }

                debug!(
                    "Closing load of {} order(s) before order {}",
                    current.len(),
                    order.id
                );
                outcome
                    .loads
                    .push(self.build_load(cluster.id, std::mem::take(&mut current)));
                current_lines.clear();
            }

            current.push(order.clone());
            current_lines.extend(order.lines.iter().cloned());
        }

        if !current.is_empty() {
            outcome.loads.push(self.build_load(cluster.id, current));
        }

        outcome
    }

    /// Floor feet an order needs on its own.
    ///
    /// An order whose lower bound is already past the trailer is not packed
    /// at all and the bound is returned, so a runaway quantity costs nothing.
    pub fn order_feet(&self, order: &Order) -> f64 {
        let bound = min_linear_feet(&order.lines);
        if bound > self.capacity_ft + EPSILON {
            return bound;
        }
        StackPacker::pack(&order.lines).total_linear_feet
    }

    /// Check whether an order can ride on a trailer at all.
    pub fn fits_alone(&self, order: &Order) -> bool {
        self.order_feet(order) <= self.capacity_ft + EPSILON
    }

    /// Check whether lines fit one trailer and may share it.
    pub fn accepts(&self, lines: &[OrderLine]) -> bool {
        !StackPacker::pack(lines).exceeds(self.capacity_ft) && self.checker.is_compatible(lines)
    }

    /// Merge two loads into one if the result fits and is compatible.
    pub fn combine(&self, first: &CandidateLoad, second: &CandidateLoad) -> Option<CandidateLoad> {
        let mut lines = first.lines();
        lines.extend(second.lines());
        if !self.accepts(&lines) {
            return None;
        }

        let orders = first
            .orders
            .iter()
            .chain(second.orders.iter())
            .cloned()
            .collect();
        Some(self.build_load(first.cluster_id, orders))
    }

    /// Pack a fixed set of orders into one load and attach its findings.
    pub fn build_load(&self, cluster_id: usize, orders: Vec<Order>) -> CandidateLoad {
        let lines: Vec<OrderLine> = orders
            .iter()
            .flat_map(|order| order.lines.iter().cloned())
            .collect();
        let pack = StackPacker::pack_on_trailer(&lines, self.trailer_type, self.capacity_ft);
        let mut warnings = self.checker.check_load(&lines, &pack.positions);

        if let Some(layout) = pack.deck_layout.filter(|layout| layout.overflows()) {
            warnings.push(Warning::advisory(WarningKind::DeckOverflow {
                lower_ft: layout.lower_used_ft,
                upper_ft: layout.upper_used_ft,
            }));
        }

        let mut load = CandidateLoad::new(cluster_id, orders, pack);
        if has_hard(&warnings) {
            load.flags.push(LoadFlag::Incompatible);
        }
        load.warnings = warnings;
        load
    }
}
