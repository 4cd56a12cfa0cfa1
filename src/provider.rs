//! Collaborators at the edge of a run: where orders come from and where
//! draft loads go.
//!
//! The optimizer core never performs I/O itself. A run pulls one snapshot of
//! orders through an [`OrderSnapshotProvider`], computes on its own copy and
//! hands finalized loads to a [`PersistenceSink`].

use crate::config::{Config, OptimizationParams};
use crate::error::{Error, Result};
use crate::order::Order;
use crate::problem::{normalize_location, CoordinateTable, Problem, RateTable};
use crate::solution::{CandidateLoad, OptimizationOutcome, OptimizationRun};
use crate::LoadOptimizer;
use log::{debug, info};
use std::collections::HashSet;
use std::sync::Mutex;

/// Supplies the orders a run works on.
pub trait OrderSnapshotProvider {
    /// Return the orders shipping from `origin` with their lines resolved.
    ///
    /// Excluded orders may be left out or returned with `excluded` set; the
    /// optimizer filters them either way.
    fn eligible_orders(&self, origin: &str) -> Result<Vec<Order>>;
}

/// Receives the finalized loads of a run.
pub trait PersistenceSink {
    /// Store every load of a run as a draft.
    ///
    /// Implementations must write all loads or none of them.
    fn persist_drafts(&self, run: &OptimizationRun, loads: &[CandidateLoad]) -> Result<()>;
}

/// Coordinate and rate tables shared by every run.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub coordinates: CoordinateTable,
    pub rates: RateTable,
}

impl ReferenceData {
    /// Create reference data from both tables.
    pub fn new(coordinates: CoordinateTable, rates: RateTable) -> Self {
        ReferenceData { coordinates, rates }
    }
}

/// Order book held in memory, e.g. loaded from a file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderBook {
    orders: Vec<Order>,
}

impl InMemoryOrderBook {
    /// Create an order book.
    pub fn new(orders: Vec<Order>) -> Self {
        InMemoryOrderBook { orders }
    }

    /// Number of orders in the book, excluded ones included.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the book is empty.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Excluded orders are returned with their flag set so the run can count
/// them.
impl OrderSnapshotProvider for InMemoryOrderBook {
    fn eligible_orders(&self, origin: &str) -> Result<Vec<Order>> {
        let origin = normalize_location(origin);
        Ok(self
            .orders
            .iter()
            .filter(|order| order.origin == origin)
            .cloned()
            .collect())
    }
}

/// A load stored as a draft together with the run that produced it.
#[derive(Debug, Clone)]
pub struct DraftRecord {
    pub run_id: u64,
    pub load: CandidateLoad,
}

#[derive(Debug, Default)]
struct DraftState {
    next_run_id: u64,
    runs: Vec<(u64, OptimizationRun)>,
    drafts: Vec<DraftRecord>,
}

/// Thread-safe in-memory draft store.
///
/// A batch is validated completely before anything is inserted, and the
/// insert happens under a single lock, so concurrent writers never observe
/// a partially written run.
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    state: Mutex<DraftState>,
}

impl InMemoryDraftStore {
    /// Create an empty store.
    pub fn new() -> Self {
        InMemoryDraftStore::default()
    }

    /// All stored drafts in insertion order.
    pub fn drafts(&self) -> Result<Vec<DraftRecord>> {
        Ok(self.lock()?.drafts.clone())
    }

    /// Number of runs persisted so far.
    pub fn run_count(&self) -> Result<usize> {
        Ok(self.lock()?.runs.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, DraftState>> {
        self.state.lock().map_err(|_| Error::Persistence {
            message: "draft store lock poisoned".to_string(),
        })
    }

    fn validate(loads: &[CandidateLoad]) -> Result<()> {
        let mut load_ids = HashSet::new();
        let mut order_ids = HashSet::new();

        for load in loads {
            if load.id.is_empty() {
                return Err(Error::Persistence {
                    message: "load without identifier".to_string(),
                });
            }
            if !load_ids.insert(load.id.as_str()) {
                return Err(Error::Persistence {
                    message: format!("load {} appears twice", load.id),
                });
            }
            if load.orders.is_empty() {
                return Err(Error::Persistence {
                    message: format!("load {} has no orders", load.id),
                });
            }
            for order in &load.orders {
                if !order_ids.insert(order.id.as_str()) {
                    return Err(Error::Persistence {
                        message: format!("order {} is on more than one load", order.id),
                    });
                }
            }
        }

        Ok(())
    }
}

impl PersistenceSink for InMemoryDraftStore {
    fn persist_drafts(&self, run: &OptimizationRun, loads: &[CandidateLoad]) -> Result<()> {
        Self::validate(loads)?;

        let mut state = self.lock()?;
        state.next_run_id += 1;
        let run_id = state.next_run_id;
        state.runs.push((run_id, run.clone()));
        state.drafts.extend(loads.iter().map(|load| DraftRecord {
            run_id,
            load: load.clone(),
        }));

        debug!("Persisted {} draft load(s) for run {}", loads.len(), run_id);
        Ok(())
    }
}

/// Run the optimizer for one request.
///
/// Parameters are validated before the snapshot is requested; an invalid
/// request touches nothing.
pub fn optimize<P: OrderSnapshotProvider + ?Sized>(
    provider: &P,
    reference: &ReferenceData,
    params: OptimizationParams,
    config: Config,
) -> Result<OptimizationOutcome> {
    params.validate()?;

    let orders = provider.eligible_orders(&params.origin)?;
    info!("Snapshot for {} holds {} order(s)", params.origin, orders.len());

    let problem = Problem::new(
        &params.origin,
        orders,
        reference.coordinates.clone(),
        reference.rates.clone(),
    );
    LoadOptimizer::new(problem, params, config).run()
}

/// Run the optimizer and store the resulting loads as drafts.
///
/// Nothing is persisted when the run fails or yields no loads.
pub fn optimize_and_persist<P, S>(
    provider: &P,
    sink: &S,
    reference: &ReferenceData,
    params: OptimizationParams,
    config: Config,
) -> Result<OptimizationOutcome>
where
    P: OrderSnapshotProvider + ?Sized,
    S: PersistenceSink + ?Sized,
{
    let outcome = optimize(provider, reference, params, config)?;
    if !outcome.is_empty() {
        sink.persist_drafts(&outcome.run, &outcome.loads)?;
    }
    Ok(outcome)
}
