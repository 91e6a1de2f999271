//! Shared run state
//!
//! One instance per run, passed by handle to the supervisor, the dispatch
//! engine, and every worker. All mutation goes through its locks; there
//! are no ambient globals.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{Signal, Trail};
use crate::models::ItemReport;

/// Identifier for a spawned worker
pub type WorkerId = u64;

/// Aggregated pass/fail outcome across all workers
///
/// Set on the first primary-phase failure and never reset for the run;
/// setup and teardown failures belong to the reporting layer.
#[derive(Debug, Default)]
pub struct SharedOutcome {
    failed: Mutex<bool>,
}

impl SharedOutcome {
    pub fn observe(&self, report: &ItemReport) {
        if report.call_failed() {
            *self.failed.lock() = true;
        }
    }

    pub fn any_failed(&self) -> bool {
        *self.failed.lock()
    }
}

/// Process-wide state shared across one run
#[derive(Debug)]
pub struct SharedRunState {
    /// Live workers, keyed by id. The dispatcher inserts at submission,
    /// only the supervisor removes.
    registry: Mutex<HashMap<WorkerId, bool>>,
    next_worker_id: AtomicU64,
    worker_limit: usize,

    /// Raised when capacity exists for another submission. Cleared by the
    /// dispatcher immediately before each submission.
    pub availability: Signal,
    /// Raised when no workers remain live.
    pub drained: Signal,
    /// Raised when the supervisor should wind down once the pool drains.
    pub stop: Signal,

    pub outcome: SharedOutcome,
    pub trail: Trail,
}

impl SharedRunState {
    pub fn new(worker_limit: usize) -> Self {
        let state = Self {
            registry: Mutex::new(HashMap::new()),
            next_worker_id: AtomicU64::new(1),
            worker_limit,
            availability: Signal::new(),
            drained: Signal::new(),
            stop: Signal::new(),
            outcome: SharedOutcome::default(),
            trail: Trail::new(),
        };
        // An empty pool is drained and has capacity from the start.
        state.recompute_signals(0);
        state
    }

    pub fn worker_limit(&self) -> usize {
        self.worker_limit
    }

    pub fn live_count(&self) -> usize {
        self.registry.lock().len()
    }

    pub fn live_worker_ids(&self) -> Vec<WorkerId> {
        self.registry.lock().keys().copied().collect()
    }

    /// Register a newly spawned worker. Signals are recomputed under the
    /// registry lock, so the drain barrier can never observe a stale empty
    /// registry mid-submission.
    pub fn register_worker(&self) -> WorkerId {
        let id = self.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let mut live = self.registry.lock();
        live.insert(id, true);
        self.recompute_signals(live.len());
        id
    }

    /// Remove a finished worker. Removing an unknown id is not an error; a
    /// worker that vanished before being observed counts as already reaped.
    pub fn reap_worker(&self, id: WorkerId) {
        let mut live = self.registry.lock();
        live.remove(&id);
        self.recompute_signals(live.len());
    }

    fn recompute_signals(&self, live: usize) {
        if live == 0 {
            self.drained.set();
        } else if self.drained.is_set() {
            self.drained.clear();
        }
        if live < self.worker_limit && !self.availability.is_set() {
            self.availability.set();
        }
    }
}
