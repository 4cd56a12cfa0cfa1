//! Tests for the cost model, scoring and load evaluation.

use chrono::NaiveDate;
use load_consolidator::config::{CompatibilityRules, Config, CostSettings, OptimizationParams};
use load_consolidator::cost::{route_efficiency, score, CostModel, LoadEvaluator};
use load_consolidator::distance::{haversine_miles, DistanceService};
use load_consolidator::order::{Order, OrderLine};
use load_consolidator::packer::GreedyPacker;
use load_consolidator::problem::{CoordinateTable, Coordinates, RateTable};
use load_consolidator::route::{RouteResult, Router};
use load_consolidator::solution::LoadFlag;
use load_consolidator::warning::WarningKind;

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn order(id: &str, destination: &str, feet: f64) -> Order {
    let line = OrderLine::new(id, "P1", 1, feet, 1, "standard", destination, due());
    Order::new(id, "ORIGIN", destination, due(), vec![line])
}

fn create_test_table() -> CoordinateTable {
    CoordinateTable::new()
        .with("ORIGIN", (0.0, 0.0))
        .with("WEST", (0.0, -0.5))
        .with("EAST1", (0.0, 1.0))
        .with("EAST2", (0.0, 2.0))
}

fn route_of(miles: f64, stops: usize) -> RouteResult {
    RouteResult {
        stops: (0..stops).map(|idx| format!("S{}", idx)).collect(),
        total_miles: miles,
        direct_miles: miles,
        origin_known: true,
        ..RouteResult::default()
    }
}

#[test]
fn test_cost_formula() {
    let settings = CostSettings::default();
    let rates = RateTable::new().with_lane("PLANT", "GA", 2.0);
    let model = CostModel::new(&settings, &rates);

    let estimate = model.estimate("PLANT", Some("GA"), &route_of(1000.0, 2));

    // 1000 mi * 1.2 * $2.00 + 2 stops * $55
    assert!((estimate.dollars - 2510.0).abs() < 1e-6);
    assert!((estimate.road_miles - 1200.0).abs() < 1e-6);
    assert_eq!(estimate.stop_count, 2);
    assert!(!estimate.rate_defaulted);
}

#[test]
fn test_cost_minimum_applies() {
    let settings = CostSettings::default();
    let rates = RateTable::new().with_lane("PLANT", "GA", 2.0);
    let model = CostModel::new(&settings, &rates);

    let estimate = model.estimate("PLANT", Some("GA"), &route_of(50.0, 1));
    assert!((estimate.dollars - 800.0).abs() < 1e-6);
}

#[test]
fn test_missing_rate_uses_default() {
    let settings = CostSettings::default();
    let rates = RateTable::new();
    let model = CostModel::new(&settings, &rates);

    let estimate = model.estimate("PLANT", Some("TX"), &route_of(1000.0, 1));
    assert!(estimate.rate_defaulted);
    assert!((estimate.rate_per_mile - 3.12).abs() < 1e-9);
    assert!((estimate.dollars - (1000.0 * 1.2 * 3.12 + 55.0)).abs() < 1e-6);
}

#[test]
fn test_score_weights() {
    let route = route_of(100.0, 1);

    // 90 * 0.6 + min(6 * 10, 50) * 0.3 + 100 * 0.1
    assert!((score(90.0, 6, &route) - 79.0).abs() < 1e-6);
    // 50 * 0.6 + 10 * 0.3 + 100 * 0.1
    assert!((score(50.0, 1, &route) - 43.0).abs() < 1e-6);
}

#[test]
fn test_route_efficiency() {
    let mut route = route_of(300.0, 3);
    route.direct_miles = 200.0;
    route.detour_miles = 100.0;
    assert!((route_efficiency(&route) - (100.0 - 100.0 / 3.0)).abs() < 1e-6);

    assert_eq!(route_efficiency(&RouteResult::default()), 100.0);
}

#[test]
fn test_evaluate_flags_detour_and_prices_farthest_lane() {
    let table = create_test_table();
    let rates = RateTable::new().with_lane("ORIGIN", "EAST2", 2.5);
    let config = Config::new();
    let params = OptimizationParams::new("ORIGIN");
    let rules = CompatibilityRules::default();

    let packer = GreedyPacker::new(&params, &rules);
    let evaluator = LoadEvaluator::new(
        Router::new(DistanceService::new(&table)),
        CostModel::new(&config.cost, &rates),
        &params,
    );

    let mut load = packer.build_load(
        0,
        vec![
            order("O1", "EAST1", 8.0),
            order("O2", "EAST2", 8.0),
            order("O3", "WEST", 8.0),
        ],
    );
    evaluator.evaluate(&mut load);

    assert!(load.is_detour_exceeded());
    assert!(load.flags.iter().any(|flag| matches!(
        flag,
        LoadFlag::DetourExceeded { detour_pct, .. } if (detour_pct - 50.0).abs() < 1e-6
    )));
    assert_eq!(load.cost.lane_region.as_deref(), Some("EAST2"));
    assert!((load.cost.rate_per_mile - 2.5).abs() < 1e-9);
    assert!((load.utilization_pct - 24.0 / 53.0 * 100.0).abs() < 1e-6);

    // The other two lanes have no rate: each solo shipment falls back
    assert!(load.standalone_cost > load.cost.dollars);
    assert!((load.consolidation_savings - (load.standalone_cost - load.cost.dollars)).abs() < 1e-9);
}

#[test]
fn test_evaluate_is_idempotent() {
    let table = create_test_table();
    let rates = RateTable::new();
    let config = Config::new();
    let params = OptimizationParams::new("ORIGIN");
    let rules = CompatibilityRules::default();

    let packer = GreedyPacker::new(&params, &rules);
    let evaluator = LoadEvaluator::new(
        Router::new(DistanceService::new(&table)),
        CostModel::new(&config.cost, &rates),
        &params,
    );

    let mut load = packer.build_load(
        0,
        vec![order("O1", "NOWHERE", 8.0), order("O2", "EAST1", 8.0)],
    );
    evaluator.evaluate(&mut load);
    let first = load.clone();
    evaluator.evaluate(&mut load);

    assert_eq!(load.warnings, first.warnings);
    assert_eq!(load.flags, first.flags);
    assert_eq!(load.cost, first.cost);
    assert!(load.warnings.iter().any(|w| matches!(
        &w.kind,
        WarningKind::UnknownLocation { location } if location == "NOWHERE"
    )));
    assert!(load
        .warnings
        .iter()
        .any(|w| matches!(w.kind, WarningKind::MissingRate { .. })));
}

#[test]
fn test_standalone_cost_of_single_order_equals_load_cost() {
    let table = create_test_table();
    let rates = RateTable::new().with_lane("ORIGIN", "EAST2", 2.5);
    let config = Config::new();
    let params = OptimizationParams::new("ORIGIN");
    let rules = CompatibilityRules::default();

    let packer = GreedyPacker::new(&params, &rules);
    let evaluator = LoadEvaluator::new(
        Router::new(DistanceService::new(&table)),
        CostModel::new(&config.cost, &rates),
        &params,
    );

    let mut load = packer.build_load(0, vec![order("O1", "EAST2", 8.0)]);
    evaluator.evaluate(&mut load);

    let miles = haversine_miles(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 2.0));
    let expected = (miles * 1.2 * 2.5 + 55.0).max(800.0);
    assert!((load.cost.dollars - expected).abs() < 1e-6);
    assert!((load.standalone_cost - load.cost.dollars).abs() < 1e-9);
    assert!(load.consolidation_savings.abs() < 1e-9);
}
