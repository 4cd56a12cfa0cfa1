//! Configuration for the load consolidation optimizer.
//!
//! [`OptimizationParams`] carries the per-request parameters a planner
//! chooses. [`Config`] holds tuning constants that rarely change between
//! runs. Both are passed explicitly to every component.

use crate::error::{Error, Result};
use crate::order::Category;
use crate::problem::normalize_location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Trailer body styles with their deck layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrailerType {
    #[default]
    StepDeck,
    Flatbed,
    Wedge,
}

impl TrailerType {
    /// Nominal length of the trailer floor in feet.
    pub fn default_capacity_ft(&self) -> f64 {
        match self {
            TrailerType::StepDeck | TrailerType::Flatbed => 53.0,
            TrailerType::Wedge => 51.0,
        }
    }

    /// Length of the raised upper deck in feet (zero for single-deck trailers).
    pub fn upper_deck_ft(&self) -> f64 {
        match self {
            TrailerType::StepDeck => 10.0,
            TrailerType::Flatbed | TrailerType::Wedge => 0.0,
        }
    }

    /// Split a floor capacity into (lower, upper) deck lengths.
    pub fn deck_lengths(&self, capacity_ft: f64) -> (f64, f64) {
        let upper = self.upper_deck_ft();
        if upper > 0.0 {
            ((capacity_ft - upper).max(0.0), upper)
        } else {
            (capacity_ft, 0.0)
        }
    }
}

impl std::str::FromStr for TrailerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s
            .trim()
            .to_ascii_lowercase()
            .replace(|c: char| c == '-' || c == ' ', "_");
        match normalized.as_str() {
            "step_deck" | "stepdeck" => Ok(TrailerType::StepDeck),
            "flatbed" => Ok(TrailerType::Flatbed),
            "wedge" => Ok(TrailerType::Wedge),
            other => Err(Error::invalid(
                "trailer_type",
                format!("unknown trailer type '{}'", other),
            )),
        }
    }
}

/// Parameters of a single optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationParams {
    /// Origin plant the loads ship from
    pub origin: String,
    /// Usable trailer floor length in feet
    pub trailer_capacity_ft: f64,
    /// Largest acceptable detour, as a percentage of the direct distance
    pub max_detour_pct: f64,
    /// Largest due-date span (days) among orders sharing a load
    pub time_window_days: u32,
    /// Radius for geographic clustering
    pub geo_radius_miles: f64,
    /// Loads below this utilization are candidates for rebalancing
    pub min_utilization_target_pct: f64,
    #[serde(default)]
    pub trailer_type: TrailerType,
    #[serde(default = "default_true")]
    pub enforce_time_window: bool,
}

fn default_true() -> bool {
    true
}

impl OptimizationParams {
    /// Create parameters with the usual planner defaults for an origin.
    pub fn new(origin: &str) -> Self {
        OptimizationParams {
            origin: normalize_location(origin),
            trailer_capacity_ft: TrailerType::StepDeck.default_capacity_ft(),
            max_detour_pct: 15.0,
            time_window_days: 7,
            geo_radius_miles: 100.0,
            min_utilization_target_pct: 70.0,
            trailer_type: TrailerType::StepDeck,
            enforce_time_window: true,
        }
    }

    /// Set the trailer capacity in feet.
    pub fn with_capacity(mut self, capacity_ft: f64) -> Self {
        self.trailer_capacity_ft = capacity_ft;
        self
    }

    /// Set the maximum detour percentage.
    pub fn with_max_detour_pct(mut self, pct: f64) -> Self {
        self.max_detour_pct = pct;
        self
    }

    /// Set the time window in days.
    pub fn with_time_window_days(mut self, days: u32) -> Self {
        self.time_window_days = days;
        self
    }

    /// Set the clustering radius in miles.
    pub fn with_geo_radius(mut self, miles: f64) -> Self {
        self.geo_radius_miles = miles;
        self
    }

    /// Set the minimum utilization target.
    pub fn with_min_utilization_target(mut self, pct: f64) -> Self {
        self.min_utilization_target_pct = pct;
        self
    }

    /// Set the trailer type.
    pub fn with_trailer_type(mut self, trailer_type: TrailerType) -> Self {
        self.trailer_type = trailer_type;
        self
    }

    /// Enable or disable the time-window split.
    pub fn with_time_window_enforced(mut self, enforce: bool) -> Self {
        self.enforce_time_window = enforce;
        self
    }

    /// Reject parameters that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(Error::invalid("origin", "origin is required"));
        }
        if !(self.trailer_capacity_ft.is_finite() && self.trailer_capacity_ft > 0.0) {
            return Err(Error::invalid(
                "trailer_capacity_ft",
                format!(
                    "trailer capacity must be a positive number of feet, got {}",
                    self.trailer_capacity_ft
                ),
            ));
        }
        if !(self.geo_radius_miles.is_finite() && self.geo_radius_miles >= 0.0) {
            return Err(Error::invalid(
                "geo_radius_miles",
                format!("radius must not be negative, got {}", self.geo_radius_miles),
            ));
        }
        if !(self.max_detour_pct.is_finite() && self.max_detour_pct >= 0.0) {
            return Err(Error::invalid(
                "max_detour_pct",
                format!(
                    "max detour must not be negative, got {}",
                    self.max_detour_pct
                ),
            ));
        }
        if !(0.0..=100.0).contains(&self.min_utilization_target_pct) {
            return Err(Error::invalid(
                "min_utilization_target_pct",
                format!(
                    "utilization target must be between 0 and 100, got {}",
                    self.min_utilization_target_pct
                ),
            ));
        }
        Ok(())
    }

    /// Detour limit as a fraction of direct distance.
    pub fn max_detour_fraction(&self) -> f64 {
        self.max_detour_pct / 100.0
    }
}

/// Freight cost constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostSettings {
    /// Correction from straight-line miles to road miles
    pub driving_multiplier: f64,
    pub per_stop_fee: f64,
    pub load_minimum_fee: f64,
    /// Used when a lane has no rate on file
    pub default_rate_per_mile: f64,
}

impl Default for CostSettings {
    fn default() -> Self {
        CostSettings {
            driving_multiplier: 1.20,
            per_stop_fee: 55.0,
            load_minimum_fee: 800.0,
            default_rate_per_mile: 3.12,
        }
    }
}

/// Category rules for sharing a trailer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityRules {
    /// Categories that may not share a trailer with any other category
    pub no_mix_categories: BTreeSet<Category>,
    /// Trailer-floor categories that warrant a check when mixed
    pub floor_type_categories: BTreeSet<Category>,
    /// Units per position above which a stack is considered unstable
    pub stack_height_ceiling: u32,
}

impl Default for CompatibilityRules {
    fn default() -> Self {
        CompatibilityRules {
            no_mix_categories: [Category::new("DUMP")].into_iter().collect(),
            floor_type_categories: [Category::new("WOODY")].into_iter().collect(),
            stack_height_ceiling: 5,
        }
    }
}

/// Tuning settings for the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cost: CostSettings,
    pub compatibility: CompatibilityRules,
    /// Run the merge pass for under-utilized loads
    pub rebalance: bool,
    /// Route loads with at most this many stops exhaustively
    pub exact_route_stop_limit: Option<usize>,
    /// Wall-clock budget, checked between clusters
    pub time_limit: Option<Duration>,
    /// Smallest cost savings (dollars) a rebalancing merge must bring
    pub min_merge_savings: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cost: CostSettings::default(),
            compatibility: CompatibilityRules::default(),
            rebalance: true,
            exact_route_stop_limit: None,
            time_limit: None,
            min_merge_savings: 10.0,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the cost constants.
    pub fn with_cost_settings(mut self, cost: CostSettings) -> Self {
        self.cost = cost;
        self
    }

    /// Set the fallback rate per mile.
    pub fn with_default_rate(mut self, rate_per_mile: f64) -> Self {
        self.cost.default_rate_per_mile = rate_per_mile;
        self
    }

    /// Set the compatibility rules.
    pub fn with_compatibility_rules(mut self, rules: CompatibilityRules) -> Self {
        self.compatibility = rules;
        self
    }

    /// Enable or disable the rebalancing pass.
    pub fn with_rebalance(mut self, rebalance: bool) -> Self {
        self.rebalance = rebalance;
        self
    }

    /// Route small loads exhaustively instead of nearest-neighbor.
    pub fn with_exact_route_stop_limit(mut self, limit: usize) -> Self {
        self.exact_route_stop_limit = Some(limit);
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    /// Set the savings a merge must reach to be accepted.
    pub fn with_min_merge_savings(mut self, dollars: f64) -> Self {
        self.min_merge_savings = dollars;
        self
    }
}
