//! Best-effort merge pass for under-utilized loads.
//!
//! This is a heuristic second stage, not a correctness requirement: loads
//! that cannot be merged are kept as they are.

use crate::cluster::due_span_days;
use crate::config::OptimizationParams;
use crate::cost::LoadEvaluator;
use crate::packer::GreedyPacker;
use crate::solution::CandidateLoad;
use crate::stack::EPSILON;
use log::{debug, info};

/// A feasible merge of two loads.
struct Merge {
    first: usize,
    second: usize,
    merged: CandidateLoad,
    savings: f64,
}

/// Merges loads under the utilization target into partners from the same
/// geographic cluster.
pub struct Rebalancer<'a> {
    packer: &'a GreedyPacker<'a>,
    evaluator: &'a LoadEvaluator<'a>,
    params: &'a OptimizationParams,
    min_savings: f64,
}

impl<'a> Rebalancer<'a> {
    /// Create a rebalancer for one run.
    pub fn new(
        packer: &'a GreedyPacker<'a>,
        evaluator: &'a LoadEvaluator<'a>,
        params: &'a OptimizationParams,
    ) -> Self {
        Rebalancer {
            packer,
            evaluator,
            params,
            min_savings: 0.0,
        }
    }

    /// Only accept merges saving at least `dollars`.
    pub fn with_min_savings(mut self, dollars: f64) -> Self {
        self.min_savings = dollars;
        self
    }

    /// Merge evaluated loads until no under-target load has a partner.
    ///
    /// Under-target loads are visited lowest utilization first. For each,
    /// every other load of the same cluster is tried; a merge must fit the
    /// trailer, stay compatible, respect the time window when enforced and
    /// stay within the detour limit, and must save at least the configured
    /// floor. The merge with the largest cost savings wins, ties going to
    /// the lower load index. The pass restarts after
    /// every merge and ends when a full sweep merges nothing.
    pub fn rebalance(&self, mut loads: Vec<CandidateLoad>) -> Vec<CandidateLoad> {
        let mut merges = 0;

        while let Some(merge) = self.next_merge(&loads) {
            debug!(
                "Merging loads {:?} and {:?} saves ${:.2}",
                loads[merge.first].order_ids(),
                loads[merge.second].order_ids(),
                merge.savings
            );
            let (low, high) = if merge.first < merge.second {
                (merge.first, merge.second)
            } else {
                (merge.second, merge.first)
            };
            loads.remove(high);
            loads[low] = merge.merged;
            merges += 1;
        }

        info!("Rebalancing merged {} load pair(s)", merges);
        loads
    }

    fn next_merge(&self, loads: &[CandidateLoad]) -> Option<Merge> {
        let target = self.params.min_utilization_target_pct;
        let mut under_target: Vec<usize> = (0..loads.len())
            .filter(|&idx| loads[idx].utilization_pct < target)
            .collect();
        under_target.sort_by(|&a, &b| {
            loads[a]
                .utilization_pct
                .total_cmp(&loads[b].utilization_pct)
                .then_with(|| a.cmp(&b))
        });

        under_target
            .into_iter()
            .find_map(|first| self.best_partner(loads, first))
    }

    fn best_partner(&self, loads: &[CandidateLoad], first: usize) -> Option<Merge> {
        let load = &loads[first];
        if load.is_incompatible() {
            return None;
        }

        let mut best: Option<Merge> = None;
        for (second, partner) in loads.iter().enumerate() {
            if second == first
                || partner.cluster_id != load.cluster_id
                || partner.is_incompatible()
            {
                continue;
            }
            if !self.within_window(load, partner) {
                continue;
            }
            let Some(mut merged) = self.packer.combine(load, partner) else {
                continue;
            };
            self.evaluator.evaluate(&mut merged);
            if merged.is_detour_exceeded() {
                continue;
            }

            let savings = load.cost.dollars + partner.cost.dollars - merged.cost.dollars;
            if savings + EPSILON < self.min_savings {
                continue;
            }
            let improves = best
                .as_ref()
                .map_or(true, |current| savings > current.savings + EPSILON);
            if improves {
                best = Some(Merge {
                    first,
                    second,
                    merged,
                    savings,
                });
            }
        }

        best
    }

    fn within_window(&self, first: &CandidateLoad, second: &CandidateLoad) -> bool {
        if !self.params.enforce_time_window {
            return true;
        }
        let orders: Vec<_> = first
            .orders
            .iter()
            .chain(second.orders.iter())
            .cloned()
            .collect();
        due_span_days(&orders) <= i64::from(self.params.time_window_days)
    }
}
