//! Candidate loads and run-level results.

use crate::config::OptimizationParams;
use crate::cost::CostEstimate;
use crate::order::{Order, OrderLine};
use crate::route::RouteResult;
use crate::stack::{utilization_grade, PackResult};
use crate::warning::{Warning, WarningKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Constraint findings the planner has to decide on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flag", rename_all = "snake_case")]
pub enum LoadFlag {
    /// The load contains a hard stacking incompatibility.
    Incompatible,
    /// The route detour is above the configured limit.
    DetourExceeded { detour_pct: f64, limit_pct: f64 },
    /// Utilization stayed under target after rebalancing.
    LowUtilization { utilization_pct: f64, target_pct: f64 },
}

/// A proposed truck load.
#[derive(Clone, Serialize, Deserialize)]
pub struct CandidateLoad {
    /// Assigned after ranking
    pub id: String,
    /// Geographic cluster the orders came from
    pub cluster_id: usize,
    pub orders: Vec<Order>,
    pub pack: PackResult,
    pub route: RouteResult,
    pub cost: CostEstimate,
    pub utilization_pct: f64,
    pub score: f64,
    /// What the orders would cost shipped one by one
    pub standalone_cost: f64,
    pub consolidation_savings: f64,
    pub warnings: Vec<Warning>,
    pub flags: Vec<LoadFlag>,
}

impl CandidateLoad {
    /// Create an unevaluated load; route, cost and score are filled in later.
    pub fn new(cluster_id: usize, orders: Vec<Order>, pack: PackResult) -> Self {
        CandidateLoad {
            id: String::new(),
            cluster_id,
            orders,
            pack,
            route: RouteResult::default(),
            cost: CostEstimate::default(),
            utilization_pct: 0.0,
            score: 0.0,
            standalone_cost: 0.0,
            consolidation_savings: 0.0,
            warnings: Vec::new(),
            flags: Vec::new(),
        }
    }

    /// All lines of all orders in load order.
    pub fn lines(&self) -> Vec<OrderLine> {
        self.orders
            .iter()
            .flat_map(|order| order.lines.iter().cloned())
            .collect()
    }

    /// Ids of the orders on this load.
    pub fn order_ids(&self) -> Vec<&str> {
        self.orders.iter().map(|order| order.id.as_str()).collect()
    }

    /// Number of orders on this load.
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Destinations in load order, duplicates included.
    pub fn destinations(&self) -> Vec<String> {
        self.orders
            .iter()
            .map(|order| order.destination.clone())
            .collect()
    }

    /// Packed floor length.
    pub fn total_linear_feet(&self) -> f64 {
        self.pack.total_linear_feet
    }

    /// Earliest and latest due date on the load.
    pub fn due_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.orders.iter().map(|order| order.due_date).min()?;
        let max = self.orders.iter().map(|order| order.due_date).max()?;
        Some((min, max))
    }

    /// Letter grade of the utilization.
    pub fn grade(&self) -> char {
        utilization_grade(self.utilization_pct)
    }

    /// Check whether a hard incompatibility was found.
    pub fn is_incompatible(&self) -> bool {
        self.flags.contains(&LoadFlag::Incompatible)
    }

    /// Check whether the detour limit was exceeded.
    pub fn is_detour_exceeded(&self) -> bool {
        self.flags
            .iter()
            .any(|flag| matches!(flag, LoadFlag::DetourExceeded { .. }))
    }

    /// Check whether the load was left under its utilization target.
    pub fn is_low_utilization(&self) -> bool {
        self.flags
            .iter()
            .any(|flag| matches!(flag, LoadFlag::LowUtilization { .. }))
    }

    /// First order id, used as a stable tie-break.
    pub fn first_order_id(&self) -> &str {
        self.orders.first().map_or("", |order| order.id.as_str())
    }
}

impl fmt::Debug for CandidateLoad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Load {}:", self.id)?;
        writeln!(f, "  Orders: {:?}", self.order_ids())?;
        writeln!(
            f,
            "  Linear Feet: {:.1} ({:.1}% / {})",
            self.pack.total_linear_feet,
            self.utilization_pct,
            self.grade()
        )?;
        writeln!(f, "  Positions: {}", self.pack.positions.len())?;
        writeln!(
            f,
            "  Route: {:?} ({:.1} mi, detour {:.1} mi)",
            self.route.stops, self.route.total_miles, self.route.detour_miles
        )?;
        writeln!(f, "  Cost: ${:.2}", self.cost.dollars)?;
        writeln!(f, "  Score: {:.2}", self.score)?;
        writeln!(f, "  Flags: {:?}", self.flags)?;
        for warning in &self.warnings {
            writeln!(f, "  {}", warning)?;
        }
        Ok(())
    }
}

/// An order too long for a single trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OversizedOrder {
    pub order: Order,
    pub linear_feet: f64,
    pub warning: Warning,
}

/// An order that has nothing to ship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmptyOrder {
    pub order: Order,
    pub warning: Warning,
}

impl EmptyOrder {
    /// Set an order aside with its warning.
    pub fn new(order: Order) -> Self {
        let warning = Warning::advisory(WarningKind::EmptyOrder {
            order_id: order.id.clone(),
        });
        EmptyOrder { order, warning }
    }
}

/// Aggregate figures over a set of loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadTotals {
    pub load_count: usize,
    pub avg_utilization_pct: f64,
    pub total_miles: f64,
    pub total_cost: f64,
}

impl LoadTotals {
    /// Sum up a set of evaluated loads.
    pub fn of(loads: &[CandidateLoad]) -> Self {
        if loads.is_empty() {
            return LoadTotals::default();
        }
        let utilization: f64 = loads.iter().map(|load| load.utilization_pct).sum();
        LoadTotals {
            load_count: loads.len(),
            avg_utilization_pct: utilization / loads.len() as f64,
            total_miles: loads.iter().map(|load| load.route.total_miles).sum(),
            total_cost: loads.iter().map(|load| load.cost.dollars).sum(),
        }
    }
}

/// Manual baseline versus optimized comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub loads_before: usize,
    pub loads_after: usize,
    pub avg_utilization_before: f64,
    pub avg_utilization_after: f64,
    pub total_miles_before: f64,
    pub total_miles_after: f64,
    pub total_cost_before: f64,
    pub total_cost_after: f64,
}

impl RunSummary {
    /// Build the comparison from both sides' totals.
    pub fn new(before: LoadTotals, after: LoadTotals) -> Self {
        RunSummary {
            loads_before: before.load_count,
            loads_after: after.load_count,
            avg_utilization_before: before.avg_utilization_pct,
            avg_utilization_after: after.avg_utilization_pct,
            total_miles_before: before.total_miles,
            total_miles_after: after.total_miles,
            total_cost_before: before.total_cost,
            total_cost_after: after.total_cost,
        }
    }

    /// Cost difference between the baseline and the optimized plan.
    pub fn cost_savings(&self) -> f64 {
        self.total_cost_before - self.total_cost_after
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    /// No order survived the exclusion filter
    NoEligibleOrders,
    /// The time limit hit between clusters; the result is partial
    DeadlineReached,
}

/// Record of one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRun {
    pub params: OptimizationParams,
    pub status: RunStatus,
    /// Explanation for a non-complete status
    pub reason: Option<String>,
    pub eligible_order_count: usize,
    pub excluded_order_count: usize,
    pub oversized_order_count: usize,
    /// Orders without lines, set aside before clustering
    #[serde(default)]
    pub empty_order_count: usize,
    pub cluster_count: usize,
    pub summary: RunSummary,
    pub runtime: Duration,
}

/// Everything a run hands back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub run: OptimizationRun,
    /// Optimized loads, best score first
    pub loads: Vec<CandidateLoad>,
    /// Loads as a planner would build them by hand
    pub baseline_loads: Vec<CandidateLoad>,
    pub oversized_orders: Vec<OversizedOrder>,
    #[serde(default)]
    pub empty_orders: Vec<EmptyOrder>,
    /// Orders skipped because the time limit was reached
    pub unprocessed_orders: Vec<String>,
}

impl OptimizationOutcome {
    /// Check whether any load was proposed.
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// Find the load carrying an order.
    pub fn load_for_order(&self, order_id: &str) -> Option<&CandidateLoad> {
        self.loads
            .iter()
            .find(|load| load.orders.iter().any(|order| order.id == order_id))
    }
}
