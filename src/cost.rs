//! Freight cost estimates and load scoring.

use crate::config::{CostSettings, OptimizationParams};
use crate::problem::RateTable;
use crate::route::{RouteResult, Router};
use crate::solution::{CandidateLoad, LoadFlag};
use crate::warning::{Warning, WarningKind};
use log::warn;
use serde::{Deserialize, Serialize};

/// Weight of utilization in the composite score.
pub const UTILIZATION_WEIGHT: f64 = 0.6;
/// Weight of the consolidation bonus in the composite score.
pub const CONSOLIDATION_WEIGHT: f64 = 0.3;
/// Weight of route efficiency in the composite score.
pub const ROUTE_EFFICIENCY_WEIGHT: f64 = 0.1;
/// Bonus points per order on a load.
pub const CONSOLIDATION_POINTS_PER_ORDER: f64 = 10.0;
/// Cap on the consolidation bonus.
pub const CONSOLIDATION_BONUS_CAP: f64 = 50.0;

/// Estimated freight cost of one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Great-circle route miles
    pub miles: f64,
    /// Miles after the driving multiplier
    pub road_miles: f64,
    pub rate_per_mile: f64,
    pub stop_count: usize,
    pub dollars: f64,
    /// Region whose lane rate was applied
    pub lane_region: Option<String>,
    /// Set when no rate was on file and the default applied
    pub rate_defaulted: bool,
}

/// Converts routes into dollar estimates.
#[derive(Debug, Clone, Copy)]
pub struct CostModel<'a> {
    settings: &'a CostSettings,
    rates: &'a RateTable,
}

impl<'a> CostModel<'a> {
    /// Create a cost model over a rate table.
    pub fn new(settings: &'a CostSettings, rates: &'a RateTable) -> Self {
        CostModel { settings, rates }
    }

    /// Rate for a lane and whether the default had to be used.
    pub fn rate_for(&self, origin: &str, region: &str) -> (f64, bool) {
        match self.rates.rate_for(origin, region) {
            Some(rate) => (rate, false),
            None => (self.settings.default_rate_per_mile, true),
        }
    }

    /// Estimate the cost of a route on the `origin → region` lane.
    ///
    /// `dollars = max(miles × multiplier × rate + stops × stop fee, minimum)`
    pub fn estimate(
        &self,
        origin: &str,
        region: Option<&str>,
        route: &RouteResult,
    ) -> CostEstimate {
        let (rate_per_mile, rate_defaulted) = match region {
            Some(region) => self.rate_for(origin, region),
            None => (self.settings.default_rate_per_mile, true),
        };
        let road_miles = route.total_miles * self.settings.driving_multiplier;
        let stop_count = route.stop_count();
        let linehaul = road_miles * rate_per_mile + stop_count as f64 * self.settings.per_stop_fee;

        CostEstimate {
            miles: route.total_miles,
            road_miles,
            rate_per_mile,
            stop_count,
            dollars: linehaul.max(self.settings.load_minimum_fee),
            lane_region: region.map(str::to_string),
            rate_defaulted,
        }
    }

    /// Estimate the cost of a routed load.
    ///
    /// The lane is priced by the region of the farthest stop; without a
    /// known farthest stop the first order's region is used.
    pub fn cost(&self, origin: &str, load: &CandidateLoad) -> CostEstimate {
        let region = load
            .route
            .farthest_stop
            .as_deref()
            .and_then(|stop| load.orders.iter().find(|order| order.destination == stop))
            .or_else(|| load.orders.first())
            .map(|order| order.rate_region().to_string());
        self.estimate(origin, region.as_deref(), &load.route)
    }
}

/// Route efficiency in percent, clamped to `[0, 100]`.
pub fn route_efficiency(route: &RouteResult) -> f64 {
    if route.total_miles <= 0.0 {
        return 100.0;
    }
    (100.0 - route.detour_miles / route.total_miles * 100.0).clamp(0.0, 100.0)
}

/// Composite ranking score of a load.
pub fn score(utilization_pct: f64, order_count: usize, route: &RouteResult) -> f64 {
    let consolidation_bonus =
        (order_count as f64 * CONSOLIDATION_POINTS_PER_ORDER).min(CONSOLIDATION_BONUS_CAP);
    utilization_pct * UTILIZATION_WEIGHT
        + consolidation_bonus * CONSOLIDATION_WEIGHT
        + route_efficiency(route) * ROUTE_EFFICIENCY_WEIGHT
}

/// Routes, costs and scores candidate loads.
#[derive(Debug, Clone, Copy)]
pub struct LoadEvaluator<'a> {
    router: Router<'a>,
    cost_model: CostModel<'a>,
    params: &'a OptimizationParams,
}

impl<'a> LoadEvaluator<'a> {
    /// Create an evaluator for one run.
    pub fn new(
        router: Router<'a>,
        cost_model: CostModel<'a>,
        params: &'a OptimizationParams,
    ) -> Self {
        LoadEvaluator {
            router,
            cost_model,
            params,
        }
    }

    /// Fill in route, cost, utilization, score and route-related findings.
    ///
    /// Findings from an earlier evaluation are replaced, so evaluating twice
    /// gives the same load.
    pub fn evaluate(&self, load: &mut CandidateLoad) {
        let origin = self.params.origin.as_str();

        load.warnings.retain(|warning| {
            !matches!(
                warning.kind,
                WarningKind::UnknownLocation { .. } | WarningKind::MissingRate { .. }
            )
        });
        load.flags
            .retain(|flag| !matches!(flag, LoadFlag::DetourExceeded { .. }));

        load.route = self.router.route(origin, &load.destinations());
        if !load.route.origin_known {
            warn!("Origin {} has no coordinates; route miles are zero", origin);
            load.warnings.push(Warning::advisory(WarningKind::UnknownLocation {
                location: origin.to_string(),
            }));
        }
        for stop in &load.route.unknown_stops {
            warn!("Destination {} has no coordinates", stop);
            load.warnings.push(Warning::advisory(WarningKind::UnknownLocation {
                location: stop.clone(),
            }));
        }

        load.cost = self.cost_model.cost(origin, load);
        if load.cost.rate_defaulted {
            let region = load.cost.lane_region.clone().unwrap_or_default();
            warn!(
                "No rate for lane {} -> {}, using default {:.2}",
                origin, region, load.cost.rate_per_mile
            );
            load.warnings.push(Warning::advisory(WarningKind::MissingRate {
                origin: origin.to_string(),
                region,
                default_rate: load.cost.rate_per_mile,
            }));
        }

        if load.route.exceeds_detour(self.params.max_detour_fraction()) {
            load.flags.push(LoadFlag::DetourExceeded {
                detour_pct: load.route.detour_pct(),
                limit_pct: self.params.max_detour_pct,
            });
        }

        load.utilization_pct = load.pack.utilization_pct(self.params.trailer_capacity_ft);
        load.score = score(load.utilization_pct, load.order_count(), &load.route);
        load.standalone_cost = self.standalone_cost(load);
        load.consolidation_savings = load.standalone_cost - load.cost.dollars;
    }

    /// Cost of shipping every order of the load on its own truck.
    pub fn standalone_cost(&self, load: &CandidateLoad) -> f64 {
        let origin = self.params.origin.as_str();
        load.orders
            .iter()
            .map(|order| {
                let route = self
                    .router
                    .route(origin, std::slice::from_ref(&order.destination));
                self.cost_model
                    .estimate(origin, Some(order.rate_region()), &route)
                    .dollars
            })
            .sum()
    }
}
