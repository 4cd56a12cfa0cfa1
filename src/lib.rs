//! # Load Consolidator
//!
//! Consolidates outbound customer orders from one origin plant into a small
//! number of well-utilized truck loads.
//!
//! Orders are clustered by destination proximity, split by due-date window,
//! packed greedily onto trailers using fractional co-stacking of product
//! units, routed with a nearest-neighbor heuristic and scored by
//! utilization, consolidation and route efficiency. An optional merge pass
//! rebalances under-utilized loads.
//!
//! Every stage is a heuristic: the result is a good plan for a planner to
//! review, not a proven optimum.

pub mod baseline;
pub mod cluster;
pub mod compatibility;
pub mod config;
pub mod cost;
pub mod distance;
pub mod error;
pub mod order;
pub mod packer;
pub mod problem;
pub mod provider;
pub mod rebalance;
pub mod route;
pub mod solution;
pub mod stack;
pub mod utils;
pub mod warning;

pub use crate::config::{Config, OptimizationParams, TrailerType};
pub use crate::error::{Error, Result};
pub use crate::order::{Order, OrderLine};
pub use crate::problem::{CoordinateTable, Problem, RateTable};
pub use crate::solution::{CandidateLoad, OptimizationOutcome, OptimizationRun, RunStatus};

use crate::baseline::BaselineBuilder;
use crate::cluster::{Cluster, GeoClusterer, TimeWindowFilter};
use crate::cost::{CostModel, LoadEvaluator};
use crate::distance::DistanceService;
use crate::packer::GreedyPacker;
use crate::problem::normalize_location;
use crate::rebalance::Rebalancer;
use crate::route::Router;
use crate::solution::{EmptyOrder, LoadFlag, LoadTotals, RunSummary};

use log::{info, warn};
use std::fmt;
use std::time::{Duration, Instant};

/// Stages of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    CollectingEligibleOrders,
    Clustering,
    TimeWindowing,
    Packing,
    RoutingAndCosting,
    Rebalancing,
    Complete,
    /// Terminal: nothing survived the exclusion filter
    NoEligibleOrders,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::CollectingEligibleOrders => "collecting eligible orders",
            RunState::Clustering => "clustering",
            RunState::TimeWindowing => "time-windowing",
            RunState::Packing => "packing",
            RunState::RoutingAndCosting => "routing and costing",
            RunState::Rebalancing => "rebalancing",
            RunState::Complete => "complete",
            RunState::NoEligibleOrders => "no eligible orders",
        };
        f.write_str(name)
    }
}

/// The orchestrator that turns an order snapshot into ranked loads.
pub struct LoadOptimizer {
    pub problem: Problem,
    pub params: OptimizationParams,
    pub config: Config,
    pub state: RunState,
    pub start_time: Instant,
}

impl LoadOptimizer {
    /// Create an optimizer for one run.
    pub fn new(problem: Problem, mut params: OptimizationParams, config: Config) -> Self {
        params.origin = normalize_location(&params.origin);
        LoadOptimizer {
            problem,
            params,
            config,
            state: RunState::Idle,
            start_time: Instant::now(),
        }
    }

    /// Run all stages and return the ranked loads.
    ///
    /// Only invalid parameters produce an error. Data gaps and constraint
    /// violations are reported on the loads; a run without eligible orders
    /// returns an empty outcome with a reason.
    pub fn run(&mut self) -> Result<OptimizationOutcome> {
        self.start_time = Instant::now();
        self.params.validate()?;

        Self::enter(&mut self.state, RunState::CollectingEligibleOrders);
        let eligible = self.problem.eligible_orders();
        let excluded_count = self.problem.excluded_count();
        let empty_orders: Vec<EmptyOrder> = self
            .problem
            .empty_orders()
            .into_iter()
            .map(EmptyOrder::new)
            .collect();
        for empty in &empty_orders {
            warn!("{}", empty.warning.message);
        }

        if eligible.is_empty() {
            Self::enter(&mut self.state, RunState::NoEligibleOrders);
            return Ok(self.empty_outcome(excluded_count, empty_orders));
        }

        let distances = DistanceService::new(&self.problem.coordinates);
        let router =
            Router::new(distances).with_exact_stop_limit(self.config.exact_route_stop_limit);
        let cost_model = CostModel::new(&self.config.cost, &self.problem.rates);
        let evaluator = LoadEvaluator::new(router, cost_model, &self.params);
        let packer = GreedyPacker::new(&self.params, &self.config.compatibility);

        Self::enter(&mut self.state, RunState::Clustering);
        let geo_clusters =
            GeoClusterer::cluster(&eligible, self.params.geo_radius_miles, &distances);
        info!(
            "{} eligible order(s) form {} geographic cluster(s)",
            eligible.len(),
            geo_clusters.len()
        );

        Self::enter(&mut self.state, RunState::TimeWindowing);
        let windowed: Vec<Vec<Cluster>> = geo_clusters
            .iter()
            .map(|cluster| {
                if self.params.enforce_time_window {
                    TimeWindowFilter::split(cluster, self.params.time_window_days)
                } else {
                    vec![cluster.clone()]
                }
            })
            .collect();

        Self::enter(&mut self.state, RunState::Packing);
        let mut loads = Vec::new();
        let mut oversized_orders = Vec::new();
        let mut processed_orders = Vec::new();
        let mut unprocessed_orders = Vec::new();
        let mut processed_clusters = 0;

        for buckets in &windowed {
            if unprocessed_orders.is_empty() && !self.deadline_reached() {
                for bucket in buckets {
                    let outcome = packer.pack_cluster(bucket);
                    loads.extend(outcome.loads);
                    oversized_orders.extend(outcome.oversized);
                    processed_orders.extend(bucket.orders.iter().cloned());
                }
                processed_clusters += 1;
            } else {
                unprocessed_orders.extend(
                    buckets
                        .iter()
                        .flat_map(|bucket| bucket.orders.iter().map(|order| order.id.clone())),
                );
            }
        }

        let deadline_hit = processed_clusters < windowed.len();
        if deadline_hit {
            warn!(
                "Time limit reached after {} of {} cluster(s); {} order(s) left unprocessed",
                processed_clusters,
                windowed.len(),
                unprocessed_orders.len()
            );
        }

        Self::enter(&mut self.state, RunState::RoutingAndCosting);
        for load in &mut loads {
            evaluator.evaluate(load);
        }

        if self.config.rebalance && !loads.is_empty() {
            Self::enter(&mut self.state, RunState::Rebalancing);
            loads = Rebalancer::new(&packer, &evaluator, &self.params)
                .with_min_savings(self.config.min_merge_savings)
                .rebalance(loads);
        }

        let target = self.params.min_utilization_target_pct;
        for load in &mut loads {
            load.flags
                .retain(|flag| !matches!(flag, LoadFlag::LowUtilization { .. }));
            if load.utilization_pct < target {
                load.flags.push(LoadFlag::LowUtilization {
                    utilization_pct: load.utilization_pct,
                    target_pct: target,
                });
            }
        }

        Self::rank(&mut loads);

        let mut baseline_loads = BaselineBuilder::build(&processed_orders, &packer);
        for (idx, load) in baseline_loads.iter_mut().enumerate() {
            evaluator.evaluate(load);
            load.id = format!("B{:03}", idx + 1);
        }

        let summary = RunSummary::new(LoadTotals::of(&baseline_loads), LoadTotals::of(&loads));
        let (status, reason) = if deadline_hit {
            (
                RunStatus::DeadlineReached,
                Some(format!(
                    "time limit reached after {} of {} cluster(s)",
                    processed_clusters,
                    windowed.len()
                )),
            )
        } else {
            (RunStatus::Complete, None)
        };

        let run = OptimizationRun {
            params: self.params.clone(),
            status,
            reason,
            eligible_order_count: eligible.len(),
            excluded_order_count: excluded_count,
            oversized_order_count: oversized_orders.len(),
            empty_order_count: empty_orders.len(),
            cluster_count: geo_clusters.len(),
            summary,
            runtime: self.start_time.elapsed(),
        };

        Self::enter(&mut self.state, RunState::Complete);
        info!(
            "{} load(s) proposed against {} manual load(s); estimated savings ${:.2}",
            summary.loads_after,
            summary.loads_before,
            summary.cost_savings()
        );

        Ok(OptimizationOutcome {
            run,
            loads,
            baseline_loads,
            oversized_orders,
            empty_orders,
            unprocessed_orders,
        })
    }

    /// Order loads by score, best first, and number them.
    fn rank(loads: &mut [CandidateLoad]) {
        loads.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.first_order_id().cmp(b.first_order_id()))
        });
        for (idx, load) in loads.iter_mut().enumerate() {
            load.id = format!("L{:03}", idx + 1);
        }
    }

    fn empty_outcome(
        &self,
        excluded_count: usize,
        empty_orders: Vec<EmptyOrder>,
    ) -> OptimizationOutcome {
        let reason = format!(
            "no eligible orders for origin {} ({} excluded, {} without lines)",
            self.params.origin,
            excluded_count,
            empty_orders.len()
        );
        warn!("{}", reason);

        OptimizationOutcome {
            run: OptimizationRun {
                params: self.params.clone(),
                status: RunStatus::NoEligibleOrders,
                reason: Some(reason),
                eligible_order_count: 0,
                excluded_order_count: excluded_count,
                oversized_order_count: 0,
                empty_order_count: empty_orders.len(),
                cluster_count: 0,
                summary: RunSummary::default(),
                runtime: self.start_time.elapsed(),
            },
            loads: Vec::new(),
            baseline_loads: Vec::new(),
            oversized_orders: Vec::new(),
            empty_orders,
            unprocessed_orders: Vec::new(),
        }
    }

    fn enter(state: &mut RunState, next: RunState) {
        info!("Run state: {} -> {}", state, next);
        *state = next;
    }

    /// Check if the time limit has been used up.
    fn deadline_reached(&self) -> bool {
        match self.config.time_limit {
            Some(limit) => self.start_time.elapsed() >= limit,
            None => false,
        }
    }

    /// Time spent since the run started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
