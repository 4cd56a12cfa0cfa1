//! Tests for the snapshot provider, the draft store and the request entry
//! points.

use chrono::NaiveDate;
use load_consolidator::config::{Config, OptimizationParams};
use load_consolidator::error::{Error, Result};
use load_consolidator::order::{Order, OrderLine};
use load_consolidator::problem::{CoordinateTable, RateTable};
use load_consolidator::provider::{
    optimize, optimize_and_persist, InMemoryDraftStore, InMemoryOrderBook, OrderSnapshotProvider,
    PersistenceSink, ReferenceData,
};
use load_consolidator::RunStatus;
use std::cell::Cell;
use std::sync::Arc;
use std::thread;

fn due() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

fn order(id: &str, origin: &str, destination: &str) -> Order {
    let line = OrderLine::new(id, "P1", 2, 8.0, 2, "standard", destination, due());
    Order::new(id, origin, destination, due(), vec![line])
}

fn create_test_reference() -> ReferenceData {
    ReferenceData::new(
        CoordinateTable::new()
            .with("PLANT", (36.1627, -86.7816))
            .with("30301", (33.7490, -84.3880))
            .with("30305", (33.8320, -84.3850)),
        RateTable::new().with_lane("PLANT", "30301", 2.8),
    )
}

fn create_test_book() -> InMemoryOrderBook {
    InMemoryOrderBook::new(vec![
        order("O1", "PLANT", "30301"),
        order("O2", "PLANT", "30305"),
        order("O3", "OTHER", "30301"),
        order("O4", "plant", "30301").with_excluded(true),
    ])
}

/// Provider that fails and counts how often it was asked.
struct FailingProvider {
    calls: Cell<usize>,
}

impl OrderSnapshotProvider for FailingProvider {
    fn eligible_orders(&self, origin: &str) -> Result<Vec<Order>> {
        self.calls.set(self.calls.get() + 1);
        Err(Error::Snapshot {
            origin: origin.to_string(),
            message: "store unavailable".to_string(),
        })
    }
}

#[test]
fn test_order_book_filters_origin_and_keeps_excluded_flag() {
    let book = create_test_book();
    let orders = book.eligible_orders("plant").unwrap();

    let ids: Vec<&str> = orders.iter().map(|order| order.id.as_str()).collect();
    assert_eq!(ids, vec!["O1", "O2", "O4"]);
    assert!(orders[2].excluded);
    assert_eq!(book.len(), 4);
}

#[test]
fn test_excluded_orders_counted_on_snapshot_runs() {
    let book = InMemoryOrderBook::new(vec![
        order("O1", "PLANT", "30301").with_excluded(true),
        order("O2", "PLANT", "30305").with_excluded(true),
    ]);
    let outcome = optimize(
        &book,
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    )
    .unwrap();

    assert_eq!(outcome.run.status, RunStatus::NoEligibleOrders);
    assert_eq!(outcome.run.excluded_order_count, 2);
    assert!(outcome
        .run
        .reason
        .as_deref()
        .map_or(false, |reason| reason.contains("2 excluded")));
}

#[test]
fn test_optimize_runs_on_snapshot() {
    let outcome = optimize(
        &create_test_book(),
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    )
    .unwrap();

    assert_eq!(outcome.run.status, RunStatus::Complete);
    assert_eq!(outcome.run.eligible_order_count, 2);
    assert_eq!(outcome.run.excluded_order_count, 1);
    assert_eq!(outcome.loads.len(), 1);
    assert_eq!(outcome.loads[0].id, "L001");
}

#[test]
fn test_invalid_params_rejected_before_snapshot() {
    let provider = FailingProvider {
        calls: Cell::new(0),
    };
    let params = OptimizationParams::new("PLANT").with_capacity(0.0);
    let result = optimize(&provider, &create_test_reference(), params, Config::new());

    assert!(matches!(
        result,
        Err(Error::InvalidParameter {
            field: "trailer_capacity_ft",
            ..
        })
    ));
    assert_eq!(provider.calls.get(), 0);
}

#[test]
fn test_snapshot_failure_propagates() {
    let provider = FailingProvider {
        calls: Cell::new(0),
    };
    let result = optimize(
        &provider,
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    );

    assert!(matches!(result, Err(Error::Snapshot { .. })));
    assert_eq!(provider.calls.get(), 1);
}

#[test]
fn test_optimize_and_persist_stores_drafts() {
    let store = InMemoryDraftStore::new();
    let outcome = optimize_and_persist(
        &create_test_book(),
        &store,
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    )
    .unwrap();

    let drafts = store.drafts().unwrap();
    assert_eq!(drafts.len(), outcome.loads.len());
    assert_eq!(store.run_count().unwrap(), 1);
    assert!(drafts.iter().all(|draft| draft.run_id == 1));
    assert_eq!(drafts[0].load.id, outcome.loads[0].id);
}

#[test]
fn test_nothing_persisted_without_loads() {
    let store = InMemoryDraftStore::new();
    let outcome = optimize_and_persist(
        &InMemoryOrderBook::new(Vec::new()),
        &store,
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    )
    .unwrap();

    assert_eq!(outcome.run.status, RunStatus::NoEligibleOrders);
    assert!(store.drafts().unwrap().is_empty());
    assert_eq!(store.run_count().unwrap(), 0);
}

#[test]
fn test_persist_is_all_or_nothing() {
    let outcome = optimize(
        &create_test_book(),
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    )
    .unwrap();

    // A second load repeating an order makes the whole batch invalid
    let mut loads = outcome.loads.clone();
    let mut duplicate = loads[0].clone();
    duplicate.id = "L999".to_string();
    loads.push(duplicate);

    let store = InMemoryDraftStore::new();
    let result = store.persist_drafts(&outcome.run, &loads);

    assert!(matches!(result, Err(Error::Persistence { .. })));
    assert!(store.drafts().unwrap().is_empty());
    assert_eq!(store.run_count().unwrap(), 0);
}

#[test]
fn test_persist_rejects_unnamed_load() {
    let outcome = optimize(
        &create_test_book(),
        &create_test_reference(),
        OptimizationParams::new("PLANT"),
        Config::new(),
    )
    .unwrap();

    let mut loads = outcome.loads.clone();
    loads[0].id.clear();

    let store = InMemoryDraftStore::new();
    assert!(store.persist_drafts(&outcome.run, &loads).is_err());
    assert!(store.drafts().unwrap().is_empty());
}

#[test]
fn test_concurrent_runs_are_independent() {
    let store = Arc::new(InMemoryDraftStore::new());
    let reference = Arc::new(create_test_reference());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let reference = Arc::clone(&reference);
            thread::spawn(move || {
                optimize_and_persist(
                    &create_test_book(),
                    store.as_ref(),
                    &reference,
                    OptimizationParams::new("PLANT"),
                    Config::new(),
                )
                .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for outcome in &outcomes[1..] {
        assert_eq!(outcome.loads.len(), outcomes[0].loads.len());
        assert_eq!(outcome.loads[0].order_ids(), outcomes[0].loads[0].order_ids());
    }

    let drafts = store.drafts().unwrap();
    assert_eq!(store.run_count().unwrap(), 4);
    assert_eq!(drafts.len(), 4 * outcomes[0].loads.len());

    // Each run's drafts are contiguous
    for chunk in drafts.chunks(outcomes[0].loads.len()) {
        assert!(chunk.iter().all(|draft| draft.run_id == chunk[0].run_id));
    }
}
